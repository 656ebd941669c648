use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tervis_core::{Language, SearchMode};

/// CLI configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "tervis")]
#[command(
    author,
    version,
    about = "Healthcare professional search with AI-composed answers"
)]
#[command(after_help = "Examples:
  tervis serve --bind 127.0.0.1:3000
  tervis search \"Dentista em São Paulo\"
  tervis locations sao
  tervis news --lang it")]
pub struct Config {
    /// PostgreSQL database connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Google Gemini API key; without it narratives always come from templates
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini model name, overrides `[ai] model` from the config file
    #[arg(long, env = "GEMINI_MODEL")]
    pub gemini_model: Option<String>,

    /// Path to tervis.toml (defaults to the user config directory)
    #[arg(long, env = "TERVIS_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Maximum PostgreSQL pool connections [default: 5]
    #[arg(long, env = "DB_MAX_CONNECTIONS")]
    pub db_max_connections: Option<u32>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API
    Serve {
        /// Socket address to listen on
        #[arg(long, env = "TERVIS_BIND", default_value = "0.0.0.0:3000")]
        bind: SocketAddr,
    },
    /// Run one search and print the professionals and the narrative
    #[command(after_help = "Example: tervis search \"psicólogo em Lisboa\" --language pt")]
    Search {
        /// Free-text query
        query: String,
        /// Answer language (pt, it, es, en)
        #[arg(short, long, default_value = "pt")]
        language: Language,
        /// Count this search against a user's daily ceiling
        #[arg(short, long)]
        user: Option<String>,
        /// Search mode for the daily ceiling (text or voice)
        #[arg(short, long, default_value = "text")]
        mode: SearchMode,
    },
    /// Print location suggestions for a partial place name
    Locations {
        /// Partial place name, at least 2 characters
        query: String,
    },
    /// Print the current health news cards
    News {
        /// Card language (pt, it, es, en)
        #[arg(short, long, default_value = "pt")]
        lang: Language,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    const DB: &str = "--database-url=postgres://localhost/tervis";

    #[test]
    fn test_parse_search() {
        let config =
            Config::try_parse_from(["tervis", DB, "search", "dor de cabeça", "-l", "es"]).unwrap();
        match config.command {
            Command::Search {
                query,
                language,
                user,
                mode,
            } => {
                assert_eq!(query, "dor de cabeça");
                assert_eq!(language, Language::Es);
                assert_eq!(user, None);
                assert_eq!(mode, SearchMode::Text);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_unknown_language_rejected() {
        assert!(Config::try_parse_from(["tervis", DB, "news", "--lang", "fr"]).is_err());
    }

    #[test]
    fn test_serve_bind_flag() {
        let config =
            Config::try_parse_from(["tervis", DB, "--log-json", "serve", "--bind", "127.0.0.1:8080"])
                .unwrap();
        assert!(config.log_json);
        match config.command {
            Command::Serve { bind } => assert_eq!(bind.port(), 8080),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
