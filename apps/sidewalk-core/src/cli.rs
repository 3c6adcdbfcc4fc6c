use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "sidewalk-core",
    version,
    about = "Piezoelectric sidewalk monitoring server"
)]
pub struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
    /// Print the OpenAPI document and exit.
    #[arg(long, default_value_t = false)]
    pub print_openapi: bool,
}
