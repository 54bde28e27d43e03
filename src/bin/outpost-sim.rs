//! Runs a navigation scenario through a `MemoryRouter` guarded by outposts.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

use router_outposts::observability::init_tracing;
use router_outposts::outpost::{
    loader_fn, outpost_fn, BoxError, OutpostHandler, OutpostSpec, Scope,
};
use router_outposts::patrol::Verdict;
use router_outposts::routing::{
    MemoryRouter, NavigationHook, NavigationResult, RedirectTarget, RouteDef,
};
use router_outposts::{Outposts, OutpostsConfig};

#[derive(Parser)]
#[command(name = "outpost-sim")]
#[command(about = "Simulate navigations against a set of outposts", long_about = None)]
struct Cli {
    /// Scenario file (TOML)
    scenario: PathBuf,

    /// Force verbose patrol logging
    #[arg(short, long)]
    verbose: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "router_outposts=info,outpost_sim=info")]
    log_filter: String,
}

#[derive(Debug, Deserialize)]
struct Scenario {
    #[serde(default)]
    patrol: OutpostsConfig,
    #[serde(default)]
    routes: Vec<RouteDef>,
    #[serde(default)]
    outposts: Vec<OutpostDecl>,
    #[serde(default)]
    navigate: Vec<RedirectTarget>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Action {
    Allow,
    Block,
    Redirect,
    Fail,
}

/// A declarative outpost.
#[derive(Debug, Deserialize)]
struct OutpostDecl {
    name: String,
    #[serde(default = "default_scope")]
    scope: Scope,
    action: Action,
    /// Redirect target, for `action = "redirect"`.
    target: Option<RedirectTarget>,
    /// Error message, for `action = "fail"`.
    message: Option<String>,
    /// Delay before the verdict.
    #[serde(default)]
    sleep_ms: u64,
    priority: Option<i32>,
    hooks: Option<Vec<NavigationHook>>,
    timeout_ms: Option<u64>,
    /// Load the handler on first use.
    #[serde(default)]
    lazy: bool,
    /// Route names to attach this outpost to after deployment.
    #[serde(default)]
    attach_to: Vec<String>,
}

fn default_scope() -> Scope {
    Scope::Global
}

impl OutpostDecl {
    fn handler(&self) -> Result<OutpostHandler, String> {
        let action = self.action;
        let sleep = Duration::from_millis(self.sleep_ms);
        let target = match (action, &self.target) {
            (Action::Redirect, None) => {
                return Err(format!("outpost \"{}\": redirect needs a target", self.name))
            }
            (_, target) => target.clone(),
        };
        let message = self
            .message
            .clone()
            .unwrap_or_else(|| format!("{} failed", self.name));

        Ok(outpost_fn(move |_ctx| {
            let target = target.clone();
            let message = message.clone();
            async move {
                if !sleep.is_zero() {
                    tokio::time::sleep(sleep).await;
                }
                match (action, target) {
                    (Action::Allow, _) => Ok(Verdict::Allow),
                    (Action::Block, _) => Ok(Verdict::Block),
                    (Action::Redirect, Some(target)) => Ok(Verdict::Redirect(target)),
                    (Action::Redirect, None) => Ok(Verdict::Block),
                    (Action::Fail, _) => Err(BoxError::from(message)),
                }
            }
        }))
    }

    fn into_spec(self) -> Result<OutpostSpec, String> {
        let handler = self.handler()?;
        let mut spec = if self.lazy {
            OutpostSpec::lazy(
                self.scope,
                self.name,
                loader_fn(move || {
                    let handler = handler.clone();
                    async move { Ok(handler) }
                }),
            )
        } else {
            OutpostSpec::new(self.scope, self.name, handler)
        };

        if let Some(priority) = self.priority {
            spec = spec.priority(priority);
        }
        if let Some(hooks) = self.hooks {
            spec = spec.applies_to(hooks);
        }
        if let Some(timeout_ms) = self.timeout_ms {
            spec = spec.timeout_ms(timeout_ms);
        }
        Ok(spec)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(&cli.log_filter);

    let content = std::fs::read_to_string(&cli.scenario)?;
    let mut scenario: Scenario = toml::from_str(&content)?;
    if cli.verbose {
        scenario.patrol.log = true;
    }

    let router = Arc::new(MemoryRouter::new(scenario.routes));
    let outposts = Outposts::builder(router.clone())
        .config(scenario.patrol)
        .install()?;

    for decl in scenario.outposts {
        let attach_to = decl.attach_to.clone();
        let name = decl.name.clone();
        outposts.deploy(decl.into_spec()?);

        // An unknown route is already reported by the outposts logger.
        for route in attach_to {
            outposts.attach_to_route(&route, [&name]);
        }
    }

    for target in scenario.navigate {
        let label = target.to_string();
        match router.navigate(target).await {
            Ok(NavigationResult::Completed(to)) => {
                println!("{:<24} -> completed at {}", label, to.full_path)
            }
            Ok(NavigationResult::Cancelled) => println!("{:<24} -> cancelled", label),
            Err(e) => println!("{:<24} -> error: {}", label, e),
        }
    }

    outposts.teardown();
    Ok(())
}
