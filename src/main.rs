use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = wealthcalc::api::Cli::parse();
    let code = wealthcalc::api::run(cli).await;
    if code != 0 {
        std::process::exit(code);
    }
}
