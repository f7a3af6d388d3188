//! Command-line client over the gRPC API
//!
//! Each invocation runs one command. `register` and `login` save the session
//! token to a file, and the credential commands read it back from there.
//!
//! ```text
//! keeper-cli register <username> <password>
//! keeper-cli login <username> <password>
//! keeper-cli add-credentials <data> [meta]
//! keeper-cli edit-credentials <id> <data> [meta]
//! keeper-cli get-credentials
//! ```

use crate::grpc::keeper::vault::{
    add_credentials_response, edit_credentials_response, get_credentials_response,
    keeper_service_client::KeeperServiceClient, login_response, register_response,
    AddCredentialsRequest, Credentials, EditCredentialsRequest, ErrorKind, Failure,
    GetCredentialsRequest, LoginRequest, RegisterRequest, Session, StoredCredentials, UserData,
};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tonic::transport::{Channel, Endpoint};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:50051";
pub const DEFAULT_TOKEN_FILE: &str = "token";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub const USAGE: &str = "Usage:
  keeper-cli register <username> <password>
  keeper-cli login <username> <password>
  keeper-cli add-credentials <data> [meta]
  keeper-cli edit-credentials <id> <data> [meta]
  keeper-cli get-credentials

Environment:
  KEEPER_GRPC_ENDPOINT  server address (default http://localhost:50051)
  KEEPER_TOKEN_FILE     session token file (default ./token)";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid arguments: {0}")]
    Usage(String),

    #[error("no session token in {}: register or log in first", .0.display())]
    NoSession(PathBuf),

    #[error("session token file {}: {source}", .path.display())]
    TokenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("server rejected the request ({kind:?}): {message}")]
    Rejected { kind: ErrorKind, message: String },

    #[error("server sent an empty response")]
    EmptyResponse,

    #[error("connection failed: {0}")]
    Connect(#[from] tonic::transport::Error),

    #[error("call failed: {0}")]
    Call(#[from] tonic::Status),
}

impl From<Failure> for ClientError {
    fn from(failure: Failure) -> Self {
        ClientError::Rejected {
            kind: ErrorKind::try_from(failure.kind).unwrap_or(ErrorKind::Unspecified),
            message: failure.error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Register { username: String, password: String },
    Login { username: String, password: String },
    AddCredentials { data: String, meta: String },
    EditCredentials { id: String, data: String, meta: String },
    GetCredentials,
}

impl Command {
    /// Parse the arguments following the program name
    pub fn parse(args: &[String]) -> Result<Self, ClientError> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        match args.as_slice() {
            ["register", username, password] => Ok(Command::Register {
                username: username.to_string(),
                password: password.to_string(),
            }),
            ["login", username, password] => Ok(Command::Login {
                username: username.to_string(),
                password: password.to_string(),
            }),
            ["add-credentials", data, rest @ ..] if rest.len() <= 1 => {
                Ok(Command::AddCredentials {
                    data: data.to_string(),
                    meta: rest.first().map(|m| m.to_string()).unwrap_or_default(),
                })
            }
            ["edit-credentials", id, data, rest @ ..] if rest.len() <= 1 => {
                Ok(Command::EditCredentials {
                    id: id.to_string(),
                    data: data.to_string(),
                    meta: rest.first().map(|m| m.to_string()).unwrap_or_default(),
                })
            }
            ["get-credentials"] => Ok(Command::GetCredentials),
            [] => Err(ClientError::Usage("missing command".to_string())),
            [cmd, ..] => Err(ClientError::Usage(format!(
                "unknown command or wrong argument count for '{}'",
                cmd
            ))),
        }
    }
}

/// Session token persisted between invocations
#[derive(Debug, Clone)]
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, token: &str) -> Result<(), ClientError> {
        std::fs::write(&self.path, token).map_err(|source| ClientError::TokenFile {
            path: self.path.clone(),
            source,
        })
    }

    pub fn load(&self) -> Result<String, ClientError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ClientError::NoSession(self.path.clone()))
            }
            Err(source) => {
                return Err(ClientError::TokenFile {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let token = contents.trim();
        if token.is_empty() {
            return Err(ClientError::NoSession(self.path.clone()));
        }
        Ok(token.to_string())
    }
}

/// Runs [`Command`]s against a keeper gRPC server
pub struct KeeperCli {
    client: KeeperServiceClient<Channel>,
    tokens: TokenFile,
}

impl KeeperCli {
    pub fn new(client: KeeperServiceClient<Channel>, tokens: TokenFile) -> Self {
        Self { client, tokens }
    }

    pub async fn connect(endpoint: &str, tokens: TokenFile) -> Result<Self, ClientError> {
        let channel = Endpoint::from_shared(endpoint.to_string())?
            .connect_timeout(REQUEST_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .connect()
            .await?;
        Ok(Self::new(KeeperServiceClient::new(channel), tokens))
    }

    /// Execute one command and return the line to print
    pub async fn run(&mut self, command: Command) -> Result<String, ClientError> {
        match command {
            Command::Register { username, password } => {
                let response = self
                    .client
                    .register(RegisterRequest {
                        user_data: Some(UserData { username, password }),
                    })
                    .await?
                    .into_inner();
                let session = match response.outcome {
                    Some(register_response::Outcome::Session(session)) => session,
                    Some(register_response::Outcome::Failure(failure)) => {
                        return Err(failure.into())
                    }
                    None => return Err(ClientError::EmptyResponse),
                };
                self.save_session(&session)?;
                Ok(format!("Registered user {}", session.user_id))
            }
            Command::Login { username, password } => {
                let response = self
                    .client
                    .login(LoginRequest {
                        user_data: Some(UserData { username, password }),
                    })
                    .await?
                    .into_inner();
                let session = match response.outcome {
                    Some(login_response::Outcome::Session(session)) => session,
                    Some(login_response::Outcome::Failure(failure)) => return Err(failure.into()),
                    None => return Err(ClientError::EmptyResponse),
                };
                self.save_session(&session)?;
                Ok(format!("Logged in as user {}", session.user_id))
            }
            Command::AddCredentials { data, meta } => {
                let token = self.tokens.load()?;
                let response = self
                    .client
                    .add_credentials(AddCredentialsRequest {
                        token,
                        credentials: Some(Credentials { data, meta }),
                    })
                    .await?
                    .into_inner();
                match response.outcome {
                    Some(add_credentials_response::Outcome::Created(created)) => {
                        Ok(format!("Stored credential {}", created.id))
                    }
                    Some(add_credentials_response::Outcome::Failure(failure)) => {
                        Err(failure.into())
                    }
                    None => Err(ClientError::EmptyResponse),
                }
            }
            Command::EditCredentials { id, data, meta } => {
                let token = self.tokens.load()?;
                let response = self
                    .client
                    .edit_credentials(EditCredentialsRequest {
                        token,
                        id: id.clone(),
                        credentials: Some(Credentials { data, meta }),
                    })
                    .await?
                    .into_inner();
                match response.outcome {
                    Some(edit_credentials_response::Outcome::Updated(_)) => {
                        Ok(format!("Updated credential {}", id))
                    }
                    Some(edit_credentials_response::Outcome::Failure(failure)) => {
                        Err(failure.into())
                    }
                    None => Err(ClientError::EmptyResponse),
                }
            }
            Command::GetCredentials => {
                let token = self.tokens.load()?;
                let response = self
                    .client
                    .get_credentials(GetCredentialsRequest { token })
                    .await?
                    .into_inner();
                match response.outcome {
                    Some(get_credentials_response::Outcome::List(list)) => {
                        Ok(render_credentials(&list.credentials))
                    }
                    Some(get_credentials_response::Outcome::Failure(failure)) => {
                        Err(failure.into())
                    }
                    None => Err(ClientError::EmptyResponse),
                }
            }
        }
    }

    fn save_session(&self, session: &Session) -> Result<(), ClientError> {
        self.tokens.save(&session.token)
    }
}

/// One tab-separated line per credential: id, data, meta
pub fn render_credentials(credentials: &[StoredCredentials]) -> String {
    if credentials.is_empty() {
        return "No credentials stored".to_string();
    }
    credentials
        .iter()
        .map(|c| format!("{}\t{}\t{}", c.id, c.data, c.meta))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse(&args(&["register", "alice", "secret123"])).unwrap(),
            Command::Register {
                username: "alice".into(),
                password: "secret123".into()
            }
        );
        assert_eq!(
            Command::parse(&args(&["add-credentials", "data1"])).unwrap(),
            Command::AddCredentials {
                data: "data1".into(),
                meta: String::new()
            }
        );
        assert_eq!(
            Command::parse(&args(&["edit-credentials", "id-1", "data2", "meta2"])).unwrap(),
            Command::EditCredentials {
                id: "id-1".into(),
                data: "data2".into(),
                meta: "meta2".into()
            }
        );
        assert_eq!(
            Command::parse(&args(&["get-credentials"])).unwrap(),
            Command::GetCredentials
        );
    }

    #[test]
    fn test_parse_rejects_bad_arguments() {
        for bad in [
            vec![],
            vec!["login", "alice"],
            vec!["get-credentials", "extra"],
            vec!["add-credentials", "d", "m", "extra"],
            vec!["delete-everything"],
        ] {
            assert!(matches!(
                Command::parse(&args(&bad)),
                Err(ClientError::Usage(_))
            ));
        }
    }

    #[test]
    fn test_token_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let tokens = TokenFile::new(dir.path().join("token"));

        assert!(matches!(tokens.load(), Err(ClientError::NoSession(_))));

        tokens.save("abc.def.ghi").unwrap();
        assert_eq!(tokens.load().unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_blank_token_file_is_no_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "  \n").unwrap();

        assert!(matches!(
            TokenFile::new(path).load(),
            Err(ClientError::NoSession(_))
        ));
    }

    #[test]
    fn test_failure_keeps_kind_and_message() {
        let err: ClientError = Failure {
            kind: ErrorKind::AlreadyExists as i32,
            error: "user already registered".into(),
        }
        .into();

        match err {
            ClientError::Rejected { kind, message } => {
                assert_eq!(kind, ErrorKind::AlreadyExists);
                assert_eq!(message, "user already registered");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_render_credentials() {
        assert_eq!(render_credentials(&[]), "No credentials stored");
        let rendered = render_credentials(&[StoredCredentials {
            id: "id-1".into(),
            owner_id: "owner".into(),
            data: "data1".into(),
            meta: "meta1".into(),
        }]);
        assert_eq!(rendered, "id-1\tdata1\tmeta1");
    }
}
