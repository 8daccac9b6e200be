use std::{error::Error, io, time::Duration};

use clap::Parser;
use sphx::*;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// searchd host
    #[arg(long, default_value = client::DEFAULT_HOST)]
    host: String,
    /// searchd port
    #[arg(long, default_value_t = u32::from(client::DEFAULT_PORT))]
    port: u32,
    /// Connect, read and write timeout in milliseconds
    #[arg(long, default_value_t = 30_000)]
    timeout_ms: u64,
    /// Number of matches to return per search
    #[arg(long, default_value_t = 20)]
    limit: u32,
}

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize env_logger; For logging to STDOUT/STDERR
    env_logger::init();

    let cli = Cli::parse();
    let mut client =
        Client::new(cli.host, cli.port)?.with_timeout(Duration::from_millis(cli.timeout_ms));
    let spec = QuerySpec::builder().limits(0, cli.limit, 1000, 0).build()?;

    let stdin = io::stdin();
    let stdout = io::stdout();

    loop {
        let cmd = match prompt(stdin.lock(), stdout.lock()) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("error: {e}");
                continue;
            }
        };

        if cmd == Command::Exit {
            break;
        }

        if let Err(e) = run(&mut client, &spec, cmd) {
            eprintln!("query error: {e}");
        }
    }

    Ok(())
}

fn run(client: &mut Client, spec: &QuerySpec, cmd: Command) -> Result<(), ClientError> {
    match cmd {
        Command::Exit => {}
        Command::Search { index, query } => {
            let result = client.query(spec, &query, &index)?;
            print!("{result}");
        }
        Command::Keywords { index, query } => {
            for keyword in client.build_keywords(&query, &index, true)? {
                println!(
                    "{} -> {} (docs={}, hits={})",
                    keyword.tokenized,
                    keyword.normalized,
                    keyword.docs.unwrap_or_default(),
                    keyword.hits.unwrap_or_default()
                );
            }
        }
        Command::Excerpt { index, words, text } => {
            let docs = vec![text];
            for excerpt in client.build_excerpts(&docs, &index, &words, &ExcerptOptions::default())?
            {
                println!("{excerpt}");
            }
        }
        Command::Update {
            index,
            attr,
            id,
            value,
        } => {
            let update = AttributeUpdate::scalar(index, vec![attr]).entry(id, vec![value]);
            println!("{} document(s) updated", client.update_attributes(&update)?);
        }
        Command::UpdateMulti {
            index,
            attr,
            id,
            values,
        } => {
            let update = AttributeUpdate::multi(index, vec![attr]).multi_entry(id, vec![values]);
            println!("{} document(s) updated", client.update_attributes(&update)?);
        }
    }
    Ok(())
}
