use keeper_service::client::{
    Command, KeeperCli, TokenFile, DEFAULT_ENDPOINT, DEFAULT_TOKEN_FILE, USAGE,
};
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("{}", USAGE);
            std::process::exit(1);
        }
    };

    let endpoint = env::var("KEEPER_GRPC_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.into());
    let tokens = TokenFile::new(
        env::var("KEEPER_TOKEN_FILE").unwrap_or_else(|_| DEFAULT_TOKEN_FILE.into()),
    );

    let mut cli = KeeperCli::connect(&endpoint, tokens).await?;
    match cli.run(command).await {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
