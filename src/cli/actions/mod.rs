pub mod server;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        suggest_url: String,
        token_url: String,
        frontend_url: String,
        skip_pattern: String,
    },
}
