use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use prettytable::{Cell, Row, Table};
use serde::Deserialize;

const API_URL: &str = "http://localhost:3000";

#[derive(Parser)]
#[command(name = "hoster")]
#[command(about = "Browse images on an image hoster server", long_about = None)]
struct Cli {
    #[arg(long, default_value = API_URL, help = "Base URL of the server")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "List every hosted image")]
    List,

    #[command(about = "Show one image with its tags and comments")]
    Show {
        #[arg(short, long, help = "Image id")]
        id: i64,

        #[arg(short, long, help = "Image title (must match the id)")]
        title: String,
    },
}

#[derive(Debug, Deserialize)]
struct Owner {
    username: String,
}

#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Comment {
    text: String,
    created_date: NaiveDate,
    user: Owner,
}

#[derive(Debug, Deserialize)]
struct Image {
    id: i64,
    title: String,
    description: String,
    image_file: String,
    date: DateTime<Utc>,
    user: Owner,
    tags: Vec<Tag>,
    comments: Vec<Comment>,
}

#[derive(Debug, Deserialize)]
struct IndexView {
    images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct ImageView {
    image: Image,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::List => list_images(&cli.url).await,
        Commands::Show { id, title } => show_image(&cli.url, id, &title).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn fetch<T: for<'de> Deserialize<'de>>(url: &str) -> Result<T> {
    let response = reqwest::get(url)
        .await
        .with_context(|| format!("Failed to reach {}", url))?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        bail!("Server answered {}: {}", status, error_text);
    }

    response.json().await.context("Unexpected response body")
}

fn tag_list(tags: &[Tag]) -> String {
    if tags.is_empty() {
        return "-".to_string();
    }
    tags.iter().map(|t| t.name.as_str()).collect::<Vec<_>>().join(", ")
}

async fn list_images(base: &str) -> Result<()> {
    let view: IndexView = fetch(&format!("{}/", base)).await?;

    if view.images.is_empty() {
        println!("📭 No images uploaded yet.");
        return Ok(());
    }

    println!("\n🖼  Images ({})\n", view.images.len());

    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("ID"),
        Cell::new("Title"),
        Cell::new("Owner"),
        Cell::new("Uploaded"),
        Cell::new("Tags"),
        Cell::new("Comments"),
    ]));

    for image in &view.images {
        let uploaded = image.date.with_timezone(&Local);
        table.add_row(Row::new(vec![
            Cell::new(&image.id.to_string()),
            Cell::new(&image.title),
            Cell::new(&image.user.username),
            Cell::new(&uploaded.format("%Y-%m-%d %H:%M").to_string()),
            Cell::new(&tag_list(&image.tags)),
            Cell::new(&image.comments.len().to_string()),
        ]));
    }

    table.printstd();
    println!();

    Ok(())
}

async fn show_image(base: &str, id: i64, title: &str) -> Result<()> {
    let url = format!("{}/images/{}/{}", base, id, urlencoding::encode(title));
    let ImageView { image } = fetch(&url).await?;

    println!("🖼  {} (#{})", image.title, image.id);
    println!("   Owner: {}", image.user.username);
    println!(
        "   Uploaded: {}",
        image.date.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S %Z")
    );
    println!("   Tags: {}", tag_list(&image.tags));
    println!("   Size: {} bytes (Base64)", image.image_file.len());
    if !image.description.is_empty() {
        println!("   {}", image.description);
    }

    if image.comments.is_empty() {
        println!("\n💬 No comments yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Date"),
        Cell::new("Author"),
        Cell::new("Comment"),
    ]));
    for comment in &image.comments {
        table.add_row(Row::new(vec![
            Cell::new(&comment.created_date.to_string()),
            Cell::new(&comment.user.username),
            Cell::new(&comment.text),
        ]));
    }

    println!();
    table.printstd();
    println!();

    Ok(())
}
