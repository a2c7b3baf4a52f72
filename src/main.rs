use anyhow::anyhow;
use log::LevelFilter;
use memefactory::{
    common::{
        meme::{MemePicture, MemeView},
        newtypes::MemeId,
        utils::{comments_label, time_ago},
    },
    config::MemeFactoryConfig,
    errors::{ApiError, MyResult},
    feed::{Feed, PageSource},
    MemeFactoryContext,
};
use std::{fs, path::Path};

const USAGE: &str = "usage: memefactory <command>

commands:
  --print-config                         print an annotated config template
  login <username> <password>            log in and store the token
  logout                                 forget the stored token
  whoami                                 show the logged in user
  memes [pages]                          list memes, default one page
  comments <meme_id> [pages]             list comments of a meme
  comment <meme_id> <text>               post a comment
  create <picture> <description> [caption:x:y ...]
                                         create a meme";

#[tokio::main]
pub async fn main() -> MyResult<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("--print-config") {
        println!("{}", doku::to_toml::<MemeFactoryConfig>());
        std::process::exit(0);
    }

    env_logger::builder()
        .filter_level(LevelFilter::Warn)
        .filter_module("memefactory", LevelFilter::Info)
        .init();

    let config = MemeFactoryConfig::read()?;
    let context = MemeFactoryContext::new(config)?;
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        ["login", username, password] => login(&context, username, password).await,
        ["logout"] => {
            context.authentication().signout()?;
            println!("Logged out");
            Ok(())
        }
        ["whoami"] => {
            let user_id = context.authentication().user_id()?;
            let user = context.client.get_user_by_id(&user_id).await?;
            println!("{} ({})", user.username, user.id);
            Ok(())
        }
        ["memes", rest @ ..] => {
            let pages = parse_pages(rest.first())?;
            let feed = context.meme_feed();
            load_pages(&feed, pages).await?;
            feed.items().iter().for_each(print_meme);
            Ok(())
        }
        ["comments", meme_id, rest @ ..] => {
            let pages = parse_pages(rest.first())?;
            let feed = context.comment_feed(MemeId::from(*meme_id));
            feed.activate().await?;
            load_pages(&feed, pages).await?;
            for view in feed.items() {
                println!(
                    "{} ({}): {}",
                    view.author.username,
                    time_ago(view.comment.created_at),
                    view.comment.content
                );
            }
            Ok(())
        }
        ["comment", meme_id, text] => {
            match context.post_comment(MemeId::from(*meme_id), text).await? {
                Some((comment, total)) => println!(
                    "Created comment {}, meme now has {}",
                    comment.id,
                    comments_label(&total.to_string())
                ),
                None => println!("Nothing to post"),
            }
            Ok(())
        }
        ["create", picture, description, captions @ ..] => {
            create(&context, picture, description, captions).await
        }
        _ => Err(anyhow!("{USAGE}").into()),
    }
}

async fn login(context: &MemeFactoryContext, username: &str, password: &str) -> MyResult<()> {
    let auth = context.authentication();
    if let Some(target) = auth.login_redirect_target(None) {
        println!("Already logged in, continue at {target}");
        return Ok(());
    }
    match context.client.login(username, password).await {
        Ok(res) => {
            let user_id = auth.authenticate(&res.jwt)?;
            println!("Logged in as {user_id}");
            Ok(())
        }
        Err(e @ (ApiError::Unauthorized | ApiError::Unknown(_))) => {
            log::warn!("Unable to login: {e}");
            Err(anyhow!(e.user_message()).into())
        }
        Err(e) => Err(e.into()),
    }
}

async fn create(
    context: &MemeFactoryContext,
    picture: &str,
    description: &str,
    captions: &[&str],
) -> MyResult<()> {
    let path = Path::new(picture);
    let file_name = path
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .ok_or_else(|| anyhow!("Invalid picture path {picture}"))?;
    let mime_type = match path.extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    };

    let feed = context.meme_feed();
    let composer = context.meme_composer(feed);
    composer.set_picture(MemePicture {
        file_name,
        mime_type: mime_type.to_string(),
        data: fs::read(path)?,
    });
    composer.set_description(description);
    for caption in captions {
        let mut parts = caption.rsplitn(3, ':');
        let (Some(y), Some(x), Some(content)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(anyhow!("Caption must look like text:x:y, got {caption}").into());
        };
        let index = composer.add_caption();
        composer.update_caption(index, content);
        composer.move_caption(index, x.parse()?, y.parse()?);
    }
    if let Some(meme) = composer.submit().await? {
        println!("Created meme {}", meme.id);
    }
    Ok(())
}

fn parse_pages(arg: Option<&&str>) -> MyResult<usize> {
    Ok(match arg {
        Some(pages) => pages.parse()?,
        None => 1,
    })
}

async fn load_pages<S: PageSource>(feed: &Feed<S>, pages: usize) -> MyResult<()> {
    feed.start().await?;
    for _ in 1..pages {
        if !feed.has_next_page() {
            break;
        }
        feed.load_next_page().await?;
    }
    Ok(())
}

fn print_meme(view: &MemeView) {
    let meme = &view.meme;
    println!(
        "[{}] {} by {} ({})",
        meme.id,
        meme.description,
        view.author.username,
        time_ago(meme.created_at)
    );
    println!("  {}", meme.picture_url);
    for text in &meme.texts {
        println!("  \"{}\" at ({}, {})", text.content, text.x, text.y);
    }
    println!("  {}", comments_label(&meme.comments_count));
}
