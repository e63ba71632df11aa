use clap::Parser;

/// Wait for documents to become searchable.
///
/// Polls the target indices with the supplied query until the minimum hit
/// count is visible, then prints the final search result as JSON on stdout.
#[derive(Parser, Debug)]
#[command(name = "vigil-cli", about = "Poll a search store until a query returns the expected documents")]
pub struct CliArgs {
    /// Query body in the store's query DSL. Read from stdin when omitted.
    #[arg(long)]
    pub query: Option<String>,

    /// Comma-separated data streams, indices, and aliases to search
    /// (wildcards supported)
    #[arg(long, default_value = "traces-*,logs-*,metrics-*")]
    pub target: String,

    /// Minimum number of hits to wait for
    #[arg(long, default_value_t = 1)]
    pub min_hits: usize,

    /// Overall timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Search store base URL
    #[arg(long, env = "ELASTICSEARCH_URL", default_value = "http://localhost:9200")]
    pub url: String,

    /// Username for basic auth
    #[arg(long, env = "ELASTICSEARCH_USERNAME")]
    pub username: Option<String>,

    /// Password for basic auth
    #[arg(long, env = "ELASTICSEARCH_PASSWORD")]
    pub password: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long)]
    pub insecure: bool,
}
