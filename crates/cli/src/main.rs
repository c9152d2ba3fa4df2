//! `quotes-cli`: run the proxy, or browse quotes and favorites through it.

use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use quotes_client::{FavoritesStore, ProxyClient, QuoteSession, QuotesApi, Translation};
use quotes_kernel::settings::Settings;
use quotes_model::{FavoriteQuote, Quote};

const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Parser)]
#[command(name = "quotes-cli", version, about = "Quote discovery from the terminal")]
struct Cli {
    /// Proxy base URL; defaults to `client.server_url`
    #[arg(long, global = true, env = "QUOTES_SERVER_URL")]
    server: Option<String>,

    /// Bearer token for favorites and recommendations
    #[arg(long, global = true, env = "QUOTES_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the proxy server
    Serve,
    /// Show a random quote
    Quote {
        /// Also translate it into this language code
        #[arg(long)]
        lang: Option<String>,
        /// Add it to your favorites
        #[arg(long)]
        save: bool,
    },
    /// Manage your favorites
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// Quotes recommended for you
    Recommend,
    /// Languages available for translation
    Languages,
}

#[derive(Debug, Subcommand)]
enum FavoritesAction {
    /// List favorites, newest first
    List,
    /// Remove the favorite for a quote id
    Remove { quote_id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load().context("failed to load settings")?;
    quotes_telemetry::init(&settings.telemetry)?;

    let Cli {
        server,
        token,
        command,
    } = cli;
    let api = match command {
        Command::Serve => return quotes_app::run(settings).await,
        _ => proxy_client(server, token, &settings)?,
    };

    match command {
        Command::Serve => Ok(()),
        Command::Quote { lang, save } => quote(api, lang.as_deref(), save).await,
        Command::Favorites { action } => favorites(api, action).await,
        Command::Recommend => {
            for quote in api.recommendations().await? {
                println!("{}", render_quote(&quote, None));
            }
            Ok(())
        }
        Command::Languages => {
            for language in api.languages().await? {
                println!("{:<4}{}", language.code, language.name);
            }
            Ok(())
        }
    }
}

/// Command-line flags win over `client.*` settings.
fn proxy_client(
    server: Option<String>,
    token: Option<String>,
    settings: &Settings,
) -> anyhow::Result<ProxyClient> {
    let server_url = server.unwrap_or_else(|| settings.client.server_url.clone());
    let token = token.or_else(|| settings.client.token.clone());
    tracing::debug!(server = %server_url, authenticated = token.is_some(), "using proxy");

    let http = reqwest::Client::builder()
        .timeout(CLIENT_TIMEOUT)
        .user_agent(concat!("quotes-cli/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;

    ProxyClient::new(http, &server_url, token).context("invalid server URL")
}

async fn quote(api: ProxyClient, lang: Option<&str>, save: bool) -> anyhow::Result<()> {
    let session = QuoteSession::new(api.clone());
    let quote = session.next_quote().await.context("could not fetch a quote")?;

    let translation = match lang {
        Some(lang) => Some(session.translate(lang).await.context("translation failed")?),
        None => None,
    };
    println!("{}", render_quote(&quote, translation.as_ref()));

    if save {
        let store = FavoritesStore::new(api);
        store.load().await.context("could not load favorites")?;
        let saved = store
            .add(&quote, translation.map(|t| t.text))
            .await
            .context("could not save favorite")?;
        println!("saved as favorite {}", saved.id);
    }
    Ok(())
}

async fn favorites(api: ProxyClient, action: FavoritesAction) -> anyhow::Result<()> {
    let store = FavoritesStore::new(api);
    store.load().await.context("could not load favorites")?;

    match action {
        FavoritesAction::List => {
            let favorites = store.list();
            if favorites.is_empty() {
                println!("no favorites yet");
            }
            for favorite in &favorites {
                println!("{}", render_favorite(favorite));
            }
        }
        FavoritesAction::Remove { quote_id } => {
            let Some(favorite) = store.find(&quote_id) else {
                bail!("quote {quote_id} is not a favorite");
            };
            store.remove(&favorite.id, &quote_id).await?;
            println!("removed {quote_id}");
        }
    }
    Ok(())
}

fn render_quote(quote: &Quote, translation: Option<&Translation>) -> String {
    let mut card = format!("\"{}\"\n    - {}", quote.content, quote.author);
    if !quote.tags.is_empty() {
        let tags: Vec<_> = quote.tags.iter().map(|t| format!("#{}", t.name)).collect();
        card.push_str(&format!("\n    {}", tags.join(" ")));
    }
    if let Some(translation) = translation {
        card.push_str(&format!("\n[{}] {}", translation.language, translation.text));
    }
    card.push('\n');
    card
}

fn render_favorite(favorite: &FavoriteQuote) -> String {
    let mut line = format!(
        "{}  {}  {}  \"{}\" - {}",
        favorite.quote_id,
        favorite.created_at.date(),
        favorite.id,
        favorite.quote.content,
        favorite.quote.author
    );
    if let Some(translated) = &favorite.translated_content {
        line.push_str(&format!("\n    {translated}"));
    }
    line
}
