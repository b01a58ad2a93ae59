//! Info command - show configuration and probe the backend.

use mull_chat::ChatConfig;

pub(crate) async fn run(config: ChatConfig) -> miette::Result<()> {
    println!("Mull");
    println!("====");
    println!();
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("Backend:");
    println!("  Endpoint:     {}", config.endpoint);
    println!("  Model:        {}", config.model.as_deref().unwrap_or("(not sent)"));
    println!("  Token field:  {}", config.token_field.key());
    println!("  Max tokens:   {}", config.max_tokens);
    println!("  Streaming:    {}", if config.stream { "on" } else { "off" });
    println!(
        "  Sampling:     temperature {}, top_p {}{}",
        config.temperature,
        config.top_p,
        config.seed.map(|s| format!(", seed {}", s)).unwrap_or_default()
    );
    println!();

    println!("Answers:");
    println!("  Parse mode:   {}", config.parse_mode);
    println!(
        "  Finish:       {}",
        if config.recovery.auto_retry {
            format!(
                "up to {} attempt(s), {} tokens +{} per retry",
                config.recovery.max_retries,
                config.recovery.finish_tokens_initial,
                config.recovery.finish_tokens_increment
            )
        } else {
            "off".to_string()
        }
    );
    println!(
        "  Summarize:    {}",
        if config.recovery.summarize { "on" } else { "off" }
    );
    println!();

    print!("Status: ");
    match config.client().check_health().await {
        Ok(()) => println!("reachable"),
        Err(e) => println!("not reachable ({})", e),
    }

    Ok(())
}
