use aqar_auth::TokenCodec;
use aqar_cli::{accounts, tokens};
use aqar_config::{JwtConfig, ServerConfig};
use aqar_db::PgPool;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "aqar-cli")]
#[command(about = "Aqar CLI - Administrative tools for the Aqar API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign a token for a user (uses JWT_SECRET and JWT_EXPIRE)
    IssueToken {
        /// User id to put in the subject claim
        #[arg(short = 'u', long)]
        user_id: Uuid,

        /// Issue a refresh token instead of an access token
        #[arg(long)]
        refresh: bool,
    },
    /// Decode a token and print its claims or the rejection reason
    InspectToken {
        token: String,
    },
    /// Mark a user's email as verified
    VerifyEmail {
        email: String,
    },
    /// Activate or deactivate an account
    SetActive {
        email: String,

        #[arg(long, action = clap::ArgAction::Set)]
        active: bool,
    },
    /// Apply pending database migrations
    Migrate,
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command).await {
        eprintln!("\n❌ {e:#}");
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::IssueToken { user_id, refresh } => {
            let codec = TokenCodec::new(&JwtConfig::from_env()?);
            println!("{}", tokens::issue(&codec, user_id, refresh)?);
        }
        Commands::InspectToken { token } => {
            let codec = TokenCodec::new(&JwtConfig::from_env()?);
            println!("{}", tokens::inspect(&codec, &token));
        }
        Commands::VerifyEmail { email } => {
            let pool = connect().await?;
            accounts::verify_email(&pool, &email).await?;
            println!("✅ Email verified for {email}");
        }
        Commands::SetActive { email, active } => {
            let pool = connect().await?;
            accounts::set_active(&pool, &email, active).await?;
            let state = if active { "activated" } else { "deactivated" };
            println!("✅ Account {state}: {email}");
        }
        Commands::Migrate => {
            let pool = connect().await?;
            aqar_db::run_migrations(&pool).await?;
            println!("✅ Migrations applied");
        }
    }
    Ok(())
}

async fn connect() -> anyhow::Result<PgPool> {
    let config = ServerConfig::from_env()?;
    Ok(aqar_db::init_db_pool(&config.database_url).await?)
}
