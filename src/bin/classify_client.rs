use clap::Parser;
use echo_server::client::{classify_url, send_image_for_classification};
use echo_server::utils::error::ErrorSeverity;
use echo_server::utils::logger;

#[derive(Parser)]
#[command(name = "classify-client")]
#[command(about = "Base64 encodes an image and sends it via POST to a classification API.")]
struct Args {
    /// Path to the image file (e.g. 'digit_4.png' or '/path/to/image.jpg')
    image_path: String,

    /// Base URL of the classification server (e.g. 'http://localhost:8081')
    server_url: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let api_url = classify_url(&args.server_url);

    match send_image_for_classification(&args.image_path, &api_url).await {
        Ok(report) => {
            println!("Response Status Code: {}", report.status);
            println!("Response Body: {}", report.body);
            Ok(())
        }
        Err(e) => {
            tracing::error!("❌ Request failed: {} (Category: {:?})", e, e.category());
            eprintln!("{}", e.user_friendly_message());
            eprintln!("{}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
            Ok(())
        }
    }
}
