use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use chirp::actions;
use chirp::api::{Api, ApiClient};
use chirp::auth::{SessionManager, TokenStore};
use chirp::config::Config;
use chirp::events::EventBus;
use chirp::models::{Comment, Tweet};
use chirp::views::{FollowingFeed, HomeFeed, ProfileView, TweetDetail};

#[derive(Parser)]
#[command(name = "chirp", about = "Client for a micro-blogging API", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the session tokens
    Login {
        username: String,
        password: String,
    },
    /// Create an account
    Register {
        username: String,
        password: String,
        confirmation: String,
    },
    /// End the session and invalidate the refresh token
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Show a page of the home feed with the side lists
    Feed {
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,
    },
    /// Show the feed of followed users, loading pages incrementally
    Following {
        /// How many pages to pull before stopping
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        pages: u32,
    },
    /// Show one tweet with its comments
    Show { id: u64 },
    /// Post a new tweet
    Post { text: String },
    /// Edit one of your tweets
    Edit { id: u64, text: String },
    /// Like or unlike a tweet
    Like { id: u64 },
    /// Comment on a tweet
    Comment { id: u64, text: String },
    /// Show a profile (your own when no username is given)
    Profile { username: Option<String> },
    /// Follow or unfollow a user
    Follow { username: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "chirp=warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let session = Arc::new(SessionManager::new(&config, TokenStore::at_default_path()));
    let api = ApiClient::new(&config, Arc::clone(&session));
    let bus = EventBus::new();

    // Keeps the access token fresh for long-running commands; dropped
    // with the runtime when the command finishes.
    let _refresh_task = Arc::clone(&session).spawn_refresh_task(config.refresh_interval());

    match cli.command {
        Command::Login { username, password } => {
            let user = session
                .login(&username, &password)
                .await
                .context("login failed")?;
            println!("Logged in as {}", user.username);
        }
        Command::Register {
            username,
            password,
            confirmation,
        } => {
            session
                .register(&username, &password, &confirmation)
                .await
                .context("registration failed")?;
            println!("Registered {}. You can log in now.", username);
        }
        Command::Logout => {
            session.logout().await;
            println!("Logged out");
        }
        Command::Whoami => match session.current_user() {
            Some(user) => println!("{} (id {})", user.username, user.id),
            None => println!("Not logged in"),
        },
        Command::Feed { page } => {
            let mut feed = HomeFeed::new(config.side_list_limit);
            // Learn total_pages from page 1 before navigating further, so
            // an out-of-range page never turns into a request.
            feed.load(&api, 1).await.context("failed to load feed")?;
            if page > 1 {
                if page > feed.total_pages {
                    bail!("page {} does not exist ({} pages)", page, feed.total_pages);
                }
                feed.load(&api, page).await.context("failed to load feed")?;
            }
            print_home(&feed);
        }
        Command::Following { pages } => {
            let feed = FollowingFeed::new();
            for _ in 0..pages {
                if !feed.load_next(&api).await.context("failed to load feed")? {
                    break;
                }
            }
            for tweet in feed.tweets() {
                print_tweet(&tweet);
            }
            if feed.has_more() {
                println!("... more available (rerun with --pages {})", pages + 1);
            }
        }
        Command::Show { id } => {
            let mut view = TweetDetail::new();
            view.load(&api, id).await.context("failed to load tweet")?;
            if let Some(tweet) = view.tweet() {
                print_tweet(tweet);
                println!("--- {} comments", tweet.comments_count);
                for comment in view.comments() {
                    print_comment(comment);
                }
            }
        }
        Command::Post { text } => {
            let tweet = actions::post_tweet(&api, &bus, &text)
                .await
                .context("failed to post")?;
            println!("Posted tweet {}", tweet.id);
        }
        Command::Edit { id, text } => {
            let prior = api.tweet_detail(id).await.context("failed to load tweet")?;
            let updated = actions::edit_tweet(&api, &bus, &prior, &text)
                .await
                .context("failed to edit")?;
            print_tweet(&updated);
        }
        Command::Like { id } => {
            let prior = api.tweet_detail(id).await.context("failed to load tweet")?;
            let updated = actions::toggle_like(&api, &bus, &prior)
                .await
                .context("failed to toggle like")?;
            println!(
                "{} tweet {} ({} likes)",
                if updated.is_liked { "Liked" } else { "Unliked" },
                updated.id,
                updated.likes_count
            );
        }
        Command::Comment { id, text } => {
            let prior = api.tweet_detail(id).await.context("failed to load tweet")?;
            let (updated, comment) = actions::add_comment(&api, &bus, &prior, &text)
                .await
                .context("failed to comment")?;
            println!(
                "Comment {} added to tweet {} ({} comments)",
                comment.id, updated.id, updated.comments_count
            );
        }
        Command::Profile { username } => {
            let username = match username.or_else(|| session.current_user().map(|u| u.username)) {
                Some(name) => name,
                None => bail!("not logged in; pass a username"),
            };
            let mut view = ProfileView::new();
            view.load(&api, &username)
                .await
                .context("failed to load profile")?;
            if let Some(profile) = view.profile() {
                print_profile_header(profile);
                for tweet in &profile.tweets {
                    print_tweet(tweet);
                }
            }
        }
        Command::Follow { username } => {
            let mut view = ProfileView::new();
            view.load(&api, &username)
                .await
                .context("failed to load profile")?;
            let following = view
                .toggle_follow(&api)
                .await
                .context("failed to toggle follow")?;
            println!(
                "{} {}",
                if following { "Now following" } else { "Unfollowed" },
                username
            );
        }
    }

    Ok(())
}

fn print_home(feed: &HomeFeed) {
    println!("Recent tweets (page {} of {})", feed.page, feed.total_pages);
    for tweet in &feed.recent {
        print_tweet(tweet);
    }

    let liked = feed.liked_preview();
    println!("-- Most liked --");
    for tweet in liked.tweets {
        println!("  {} ({} likes): {}", tweet.poster, tweet.likes_count, tweet.tweet);
    }
    if liked.see_more {
        println!("  ... see more");
    }

    let commented = feed.commented_preview();
    println!("-- Most commented --");
    for tweet in commented.tweets {
        println!(
            "  {} ({} comments): {}",
            tweet.poster, tweet.comments_count, tweet.tweet
        );
    }
    if commented.see_more {
        println!("  ... see more");
    }

    let controls: Vec<String> = feed
        .page_controls()
        .iter()
        .map(|c| {
            if c.active {
                format!("[{}]", c.number)
            } else {
                c.number.to_string()
            }
        })
        .collect();
    println!("Pages: {}", controls.join(" "));
}

fn print_tweet(tweet: &Tweet) {
    println!(
        "#{} {} ({}){}: {} [{} likes, {} comments]{}",
        tweet.id,
        tweet.poster,
        tweet.date_posted.format("%Y-%m-%d %H:%M"),
        if tweet.edited { " (edited)" } else { "" },
        tweet.tweet,
        tweet.likes_count,
        tweet.comments_count,
        if tweet.is_liked { " ♥" } else { "" },
    );
}

fn print_comment(comment: &Comment) {
    println!(
        "  {} ({}): {}",
        comment.commenter,
        comment.commented.format("%Y-%m-%d %H:%M"),
        comment.comment
    );
}

fn print_profile_header(profile: &chirp::models::Profile) {
    let user = &profile.user;
    println!(
        "@{} — {} followers, {} following{}{}",
        user.username,
        user.followers_count,
        user.following_count,
        if user.is_following { " (following)" } else { "" },
        if user.is_self_profile { " (you)" } else { "" },
    );
}
