use anyhow::Result;
use clap::{Parser, Subcommand};
use shared::{
    domain::{BoardId, PostId},
    protocol::LoadedPost,
};
use storage::Storage;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/board.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    CreateBoard {
        name: String,
    },
    CreatePost {
        board_id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    ListPosts {
        board_id: i64,
    },
    ShowPost {
        post_id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::CreateBoard { name } => {
            let board_id = storage.create_board(&name).await?;
            println!("created board_id={board_id}");
        }
        Command::CreatePost {
            board_id,
            title,
            content,
        } => {
            let post_id = storage
                .create_post(title.as_deref(), content.as_deref(), BoardId(board_id))
                .await?;
            println!("created post_id={post_id}");
        }
        Command::ListPosts { board_id } => {
            for post in storage.list_post_titles_for_board(BoardId(board_id)).await? {
                println!(
                    "{}\t{}",
                    post.id,
                    post.title.as_deref().unwrap_or("(제목 없음)")
                );
            }
        }
        Command::ShowPost { post_id } => {
            let post_id = PostId(post_id);
            let Some(post) = storage.get_post(post_id).await? else {
                anyhow::bail!("post {post_id} not found");
            };
            let comments = storage.list_comment_views_for_post(post_id).await?;
            let loaded = LoadedPost { post, comments };
            println!("{}", serde_json::to_string_pretty(&loaded)?);
        }
    }

    Ok(())
}
