use finance_intent_router::{
    clock::SystemClock,
    config::RouterConfig,
    ledger,
    models::{RouterReply, Utterance},
    router::Router,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

const SESSION_ID: &str = "cli";

fn print_reply(reply: &RouterReply) {
    match &reply.reply_ur {
        Some(ur) => println!("{}\n{}", ur, reply.reply_en),
        None => println!("{}", reply.reply_en),
    }
    if let Some(disclaimer) = &reply.disclaimer {
        println!("({})", disclaimer);
    }
    println!(
        "  [{} {:.2}{}]",
        reply.intent,
        reply.confidence,
        if reply.clarification { ", clarifying" } else { "" }
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Logs go to stderr so they do not interleave with replies.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = RouterConfig::from_env()?;
    let clock = Arc::new(SystemClock);
    let ledger = ledger::from_config(&config, clock.clone())?;
    let router = Router::new(config, ledger, clock)?;

    info!("Finance Intent Router CLI starting");
    println!("Type a message. /reset clears the session, /quit exits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                router.reset_session(SESSION_ID).await;
                println!("Session cleared.");
            }
            text => {
                let reply = router.handle_message(SESSION_ID, Utterance::text(text)).await;
                print_reply(&reply);
            }
        }
    }

    Ok(())
}
