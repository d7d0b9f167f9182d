use anyhow::Context;
use clap::{Parser, Subcommand};
use pdfshare_core::constants::PDF_MIME_TYPE;
use pdfshare_core::{
    AuthState, Comment, Document, Identity, OwnerListing, SelectedFile, ShareRoute,
    ShareServices, UploadForm,
};
use pdfshare_types::{EmailAddress, OwnerId};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pdfshare")]
#[command(about = "pdfshare document sharing CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List an owner's documents
    List {
        /// Owner id as issued by the identity provider
        #[arg(long)]
        owner: String,
        /// Case-insensitive display name filter
        #[arg(long)]
        search: Option<String>,
    },
    /// Upload a PDF as an owner
    Upload {
        #[arg(long)]
        owner: String,
        /// Uploader email recorded on the document
        #[arg(long)]
        email: Option<String>,
        /// Content type to upload with (default: guessed from the extension)
        #[arg(long)]
        mime_type: Option<String>,
        path: PathBuf,
    },
    /// Show the document behind a share id
    Resolve { share_id: String },
    /// Print a shared document's comment thread
    Comments { share_id: String },
    /// Post a comment on a shared document
    Comment {
        share_id: String,
        text: String,
        /// Author label (default: Anonymous)
        #[arg(long)]
        author: Option<String>,
    },
    /// Print a share link
    Link {
        share_id: String,
        /// `shared` or `pdf`
        #[arg(long, default_value = "shared")]
        route: String,
    },
    /// Email a share link to a recipient
    Invite {
        share_id: String,
        email: String,
        /// Must be the document's owner
        #[arg(long)]
        owner: String,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pdfshare_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'pdfshare --help' for commands");
        return Ok(());
    };

    let cfg = api_rest::startup::core_config_from_env()?;
    let dispatcher = api_rest::startup::dispatcher_from_env()?;
    let services = ShareServices::from_config(&cfg, dispatcher)?;

    match command {
        Commands::List { owner, search } => {
            let auth = signed_in(&owner, None)?;
            let mut listing = OwnerListing::new(services.registry.clone());
            listing.on_auth_state(auth)?;
            listing.set_search(search.unwrap_or_default());

            let documents = listing.visible();
            if documents.is_empty() {
                println!("No documents found.");
            }
            for document in documents {
                print_document(document);
            }
        }
        Commands::Upload {
            owner,
            email,
            mime_type,
            path,
        } => {
            let auth = signed_in(&owner, email.as_deref())?;
            let bytes = std::fs::read(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let file = SelectedFile {
                file_name: file_name(&path),
                mime_type: mime_type.unwrap_or_else(|| guess_mime_type(&path).to_owned()),
                bytes,
            };

            match UploadForm::new().select(file).submit(&services.uploads, &auth) {
                Ok((document, _)) => {
                    print_document(&document);
                    println!(
                        "Share link: {}",
                        services.sharing.share_link(&document, ShareRoute::Shared)
                    );
                }
                Err((e, form)) => {
                    anyhow::bail!("failed to upload {}: {}", form.file().file_name, e)
                }
            }
        }
        Commands::Resolve { share_id } => {
            let document = services.sharing.resolve(&share_id)?;
            print_document(&document);
        }
        Commands::Comments { share_id } => {
            let comments = services.sharing.comments(&share_id)?;
            if comments.is_empty() {
                println!("No comments yet.");
            }
            for comment in &comments {
                print_comment(comment);
            }
        }
        Commands::Comment {
            share_id,
            text,
            author,
        } => {
            let comments = services
                .sharing
                .comment(&share_id, author.as_deref(), &text)?;
            for comment in &comments {
                print_comment(comment);
            }
        }
        Commands::Link { share_id, route } => {
            let route: ShareRoute = route.parse()?;
            println!("{}", services.sharing.link_for(&share_id, route)?);
        }
        Commands::Invite {
            share_id,
            email,
            owner,
        } => {
            let owner = OwnerId::parse(&owner)?;
            let outcome = services.sharing.invite(&owner, &share_id, &email)?;
            match outcome.error {
                None => println!("Invitation sent to {}", email),
                Some(e) => eprintln!("Invitation not sent: {}", e),
            }
        }
    }

    Ok(())
}

fn signed_in(owner: &str, email: Option<&str>) -> anyhow::Result<AuthState> {
    let owner_id = OwnerId::parse(owner)?;
    let email = email.map(EmailAddress::parse).transpose()?;
    Ok(AuthState::Authenticated(Identity::new(owner_id, email)))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn guess_mime_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => PDF_MIME_TYPE,
        _ => "application/octet-stream",
    }
}

fn print_document(document: &Document) {
    println!(
        "Share: {}, Name: {}, Size: {} bytes, Created: {}",
        document.share_id, document.display_name, document.size_bytes, document.created_at
    );
}

fn print_comment(comment: &Comment) {
    println!(
        "[{}] {}: {}",
        comment.created_at, comment.author_label, comment.text
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_mime_type_by_extension() {
        assert_eq!(guess_mime_type(Path::new("a/report.PDF")), PDF_MIME_TYPE);
        assert_eq!(
            guess_mime_type(Path::new("image.png")),
            "application/octet-stream"
        );
        assert_eq!(guess_mime_type(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn test_signed_in_validates_identity() {
        assert!(signed_in("uid-a", Some("a@example.com")).is_ok());
        assert!(signed_in("", None).is_err());
        assert!(signed_in("uid-a", Some("not-an-email")).is_err());
    }

    #[test]
    fn test_cli_parses_link_route() {
        let cli = Cli::try_parse_from(["pdfshare", "link", "abc", "--route", "pdf"]).unwrap();
        match cli.command {
            Some(Commands::Link { share_id, route }) => {
                assert_eq!(share_id, "abc");
                assert_eq!(route, "pdf");
            }
            _ => panic!("expected link command"),
        }
    }
}
