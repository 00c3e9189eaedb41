pub mod server;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        store_url: String,
        store_anon_key: String,
        store_service_key: Option<String>,
        site_url: String,
    },
}
