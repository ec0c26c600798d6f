// Terminal chat client binary

use std::io::{self, BufRead, Write};

use clap::{Parser, ValueEnum};

use domain_chat_router::client::{ask_with_continuation, Conversation, RelayClient};
use domain_chat_router::client::conversation::DEFAULT_SYSTEM_PROMPT;
use domain_chat_router::web::models::{clamp_max_new_tokens, ProviderKind};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ProviderArg {
    Finetuned,
    Openai,
}

impl From<ProviderArg> for ProviderKind {
    fn from(value: ProviderArg) -> Self {
        match value {
            ProviderArg::Finetuned => ProviderKind::Finetuned,
            ProviderArg::Openai => ProviderKind::Openai,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "domain_chat_cli",
    about = "Terminal chat client for the domain chat router"
)]
struct Args {
    /// Relay base URL
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    relay: String,

    /// Backend provider; the relay's configured default applies when omitted
    #[arg(long, value_enum)]
    provider: Option<ProviderArg>,

    /// Requested output budget per call (clamped into the advertised range)
    #[arg(long, default_value_t = 256)]
    max_new_tokens: u32,

    /// Ask one question with continue-if-truncated rounds, then exit
    #[arg(long)]
    ask: Option<String>,

    /// Override the system prompt for this session
    #[arg(long)]
    system: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let provider = args.provider.map(ProviderKind::from);

    // Pre-clamp the requested budget against the relay's advertised limits;
    // the relay re-clamps regardless.
    let mut requested = args.max_new_tokens;
    match RelayClient::fetch_limits(&args.relay) {
        Ok(limits) => {
            requested = clamp_max_new_tokens(Some(f64::from(requested)), limits.max_new_tokens_limit);
            eprintln!(
                "relay limits: max_new_tokens {}..{}, context {} tokens, default provider {}",
                limits.max_new_tokens_floor,
                limits.max_new_tokens_limit,
                limits.context_tokens_limit,
                limits.provider_default
            );
        }
        Err(e) => eprintln!("warning: could not fetch relay limits: {e}"),
    }

    let client = RelayClient::new(args.relay.clone(), provider, requested);

    if let Some(prompt) = args.ask {
        return run_ask(&client, &prompt);
    }

    run_repl(&client, args.system.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT))
}

/// Single-question mode: keep asking until the answer looks finished or the
/// round cap is reached, showing progress between rounds.
fn run_ask(client: &RelayClient, prompt: &str) -> anyhow::Result<()> {
    let mut rounds = 0usize;
    match ask_with_continuation(client, prompt, |accumulated| {
        rounds += 1;
        eprintln!("[round {rounds}] {} chars so far", accumulated.len());
    }) {
        Ok(answer) => {
            println!("{answer}");
            Ok(())
        }
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

/// Multi-turn mode: one submission in flight at a time, blank input ignored,
/// errors shown without touching the transcript.
fn run_repl(client: &RelayClient, system_prompt: &str) -> anyhow::Result<()> {
    let mut conversation = Conversation::new(system_prompt);
    println!("Type a message and press Enter. 'exit' quits.");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("you> ");
        io::stdout().flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => break, // EOF
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "exit" || input == "quit" {
            break;
        }

        conversation.push_user(input);
        match client.chat(&conversation.trimmed_history()) {
            Ok(text) => {
                println!("assistant> {text}\n");
                conversation.push_assistant(text);
            }
            Err(e) => {
                // No assistant turn is appended for a failed submission
                eprintln!("error: {e}\n");
            }
        }
    }

    Ok(())
}
