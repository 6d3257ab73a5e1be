//! 推文 CLI 客户端
//!
//! 非交互式 CLI，用于测试和展示推文 SDK 功能
//! 启动时通过命令行参数指定 API 地址、数据库与身份，执行一个子命令后退出

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use feed_sdk_core_rust::feed::client::{ClientConfig, FeedClient};
use feed_sdk_core_rust::feed::identity::{SessionIdentity, StaticIdentity, StoredProfile};
use feed_sdk_core_rust::feed::sync::{FeedListener, PublishOutcome};
use feed_sdk_core_rust::feed::tweet::models::{CreateTweetInput, Tweet};
use feed_sdk_core_rust::feed::types::{DEFAULT_API_ROOT, DEFAULT_EMAIL};
use feed_sdk_core_rust::feed::view::{SearchView, SortOption};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// 推文 CLI 客户端
#[derive(Parser, Debug)]
#[command(name = "feed-cli")]
#[command(about = "推文 CLI 客户端 - 用于测试和展示推文 SDK 功能", long_about = None)]
struct Args {
    /// 示例 API 根地址
    #[arg(long, default_value = DEFAULT_API_ROOT)]
    api_root: String,

    /// 本地数据库 URL
    #[arg(long, default_value = "sqlite://feed.db?mode=rwc")]
    db: String,

    /// 请求超时（秒），0 表示不设超时
    #[arg(long, default_value = "0")]
    timeout: u64,

    /// 登录用户 ID（模拟托管身份服务的会话）
    #[arg(long)]
    user_id: Option<String>,

    /// 登录用户邮箱
    #[arg(long)]
    email: Option<String>,

    /// 资料表中的显示名
    #[arg(long)]
    name: Option<String>,

    /// 资料表中的 handle
    #[arg(long)]
    handle: Option<String>,

    /// 日志级别（默认: info,feed_sdk_core_rust=debug）
    #[arg(long, default_value = "info,feed_sdk_core_rust=debug")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 申请 token（不带参数时使用默认邮箱），或用 --manual 手动设置
    Token {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        manual: Option<String>,
    },
    /// 按时间倒序展示推文
    Feed {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// 搜索推文
    Search {
        #[arg(default_value = "")]
        query: String,
        /// newest / oldest / most-liked
        #[arg(long, default_value = "newest")]
        sort: SortOption,
        #[arg(long, default_value = "1")]
        page: usize,
    },
    /// 发布推文
    Post {
        text: String,
        #[arg(long)]
        image: Option<String>,
    },
    /// 用户主页
    User { handle: String },
    /// 清除 token 与本地数据
    Logout,
}

/// 初始化日志（同时输出到 stdout 和文件）
fn init_logger(log_level: &str) -> Result<()> {
    use std::fs::OpenOptions;
    use std::io;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    // 优先使用环境变量 RUST_LOG（如果设置了），否则使用命令行参数
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .context("无法创建日志文件 debug.log")?;

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(true);

    // 文件不需要颜色
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    info!("[CLI] 📝 日志已同时输出到控制台和文件: debug.log");
    Ok(())
}

/// 输出所有状态变化
struct CliFeedListener;

#[async_trait::async_trait]
impl FeedListener for CliFeedListener {
    async fn on_tweets_changed(&self, tweets_json: String) {
        info!("[CLI/Feed] 🐦 推文列表变更: {} 字节", tweets_json.len());
    }

    async fn on_tweets_loading_changed(&self, loading: bool) {
        info!("[CLI/Feed] ⏳ 推文加载中: {}", loading);
    }

    async fn on_profiles_changed(&self, profiles_json: String) {
        info!("[CLI/Feed] 👥 资料列表变更: {} 字节", profiles_json.len());
    }

    async fn on_profiles_loading_changed(&self, loading: bool) {
        info!("[CLI/Feed] ⏳ 资料加载中: {}", loading);
    }

    async fn on_token_changed(&self, has_token: bool) {
        info!("[CLI/Feed] 🔑 token 状态: {}", if has_token { "已设置" } else { "已清除" });
    }
}

fn print_tweet(tweet: &Tweet) {
    info!(
        "[CLI]   #{} {} (@{}) ❤ {} | {}",
        tweet.id,
        tweet.author,
        tweet.handle,
        tweet.like_count(),
        tweet.text
    );
}

fn identity_from_args(args: &Args) -> Option<StaticIdentity> {
    let user_id = args.user_id.clone()?;
    Some(StaticIdentity {
        session: Some(SessionIdentity {
            user_id,
            email: args.email.clone(),
        }),
        profile: Some(StoredProfile {
            name: args.name.clone(),
            handle: args.handle.clone(),
            avatar_url: None,
        }),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(&args.log_level)?;

    info!("[CLI] 🚀 推文 CLI 客户端");
    info!("[CLI] 🌐 API: {}", args.api_root);

    let mut config = ClientConfig::new(args.db.clone());
    config.api_root = args.api_root.clone();
    config.default_email = args.email.clone().unwrap_or_else(|| DEFAULT_EMAIL.to_string());
    if args.timeout > 0 {
        config.request_timeout = Some(Duration::from_secs(args.timeout));
    }

    let mut client = FeedClient::new(config);
    client.set_feed_listener(Arc::new(CliFeedListener));
    if let Some(identity) = identity_from_args(&args) {
        client.set_identity_provider(Arc::new(identity));
    }
    client
        .connect()
        .await
        .map_err(|e| anyhow::anyhow!("连接失败: {}", e))?;

    match args.command {
        Command::Token { email, manual } => {
            if let Some(token) = manual {
                client.set_token_manually(&token).await?;
                info!("[CLI] ✅ 已手动设置 token");
            } else if client.request_token(email.as_deref()).await? {
                info!("[CLI] ✅ 已获取 token");
            } else {
                warn!("[CLI] ⚠️ 服务器未返回 token");
            }
        }
        Command::Feed { limit } => {
            let tweets = client.home_feed().await?;
            info!("[CLI] 📋 推文列表（共 {} 条）:", tweets.len());
            tweets.iter().take(limit).for_each(print_tweet);
        }
        Command::Search { query, sort, page } => {
            let mut view = SearchView::new();
            view.set_query(query);
            view.set_sort(sort);
            view.submit_search();
            // 先计算一次，记录推文条数，之后的翻页不会被重置
            client.search(&mut view).await?;
            view.set_page(page);
            let result = client.search(&mut view).await?;
            info!(
                "[CLI] 🔍 \"{}\" 按 {} 排序：共 {} 条，第 {}/{} 页",
                view.query(),
                view.sort().label(),
                result.total,
                result.page,
                result.page_count
            );
            result.items.iter().for_each(print_tweet);
        }
        Command::Post { text, image } => {
            let input = CreateTweetInput {
                image,
                ..CreateTweetInput::new(text)
            };
            let outcome = client.publish_tweet(input).await?;
            match &outcome {
                PublishOutcome::Skipped => warn!("[CLI] ⚠️ 未发布：正文为空或没有 token"),
                PublishOutcome::Confirmed(_) => info!("[CLI] ✅ 已发布并在服务器列表中确认"),
                PublishOutcome::Unconfirmed(_) => warn!("[CLI] ⚠️ 已发布，但服务器列表中暂未出现"),
                PublishOutcome::RefetchFailed(_) => warn!("[CLI] ⚠️ 已发布，重新拉取失败"),
            }
            if let Some(tweet) = outcome.tweet() {
                print_tweet(tweet);
            }
        }
        Command::User { handle } => {
            let page = client.user_page(&handle).await?;
            match &page.profile {
                Some(profile) => info!(
                    "[CLI] 👤 {} (@{}) | 关注者 {} | 正在关注 {}",
                    profile.name,
                    profile.handle,
                    profile.followers.unwrap_or(0),
                    profile.following.unwrap_or(0)
                ),
                None => warn!("[CLI] ⚠️ 找不到用户 @{}", handle),
            }
            info!("[CLI] 📋 推文（共 {} 条）:", page.tweets.len());
            page.tweets.iter().for_each(print_tweet);
        }
        Command::Logout => {
            client.clear_token().await?;
            info!("[CLI] 👋 已清除 token 与本地数据");
        }
    }

    Ok(())
}
