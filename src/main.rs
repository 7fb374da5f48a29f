use buckup::cli::{self, Args};
use buckup::config::Profile;
use buckup::error::AppError;
use buckup::store::S3Store;
use clap::Parser;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("Error [{}]: {}", e.code(), e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), AppError> {
    let profile_path = args.profile.clone().unwrap_or_else(Profile::default_path);
    let profile = Profile::load(&profile_path)?.merged_with(
        args.endpoint,
        args.region,
        args.access_key,
        args.secret_key,
    );

    let store = match (&profile.endpoint, profile.static_credentials()?) {
        (Some(endpoint), Some((access_key, secret_key))) => {
            log::info!("Using custom endpoint: {}", endpoint);
            S3Store::new_with_endpoint(
                endpoint.clone(),
                profile.region.clone(),
                access_key,
                secret_key,
            )
            .await?
        }
        (Some(_), None) => {
            return Err(AppError::Config(
                "a custom endpoint requires --access-key and --secret-key".to_string(),
            ));
        }
        (None, _) => S3Store::new(profile.region.clone()).await?,
    };

    cli::run_menu(&store, &profile).await
}
