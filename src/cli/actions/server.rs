use crate::atingi::{self, guard::RouteGuard, suggest::SuggestClient};
use crate::cli::actions::Action;
use anyhow::{Context, Result};
use url::Url;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            suggest_url,
            token_url,
            frontend_url,
            skip_pattern,
        } => {
            // Fail fast on malformed URLs instead of at the first request.
            Url::parse(&token_url)
                .with_context(|| format!("Invalid token service URL: {token_url}"))?;

            let route_guard = RouteGuard::new(&skip_pattern, &token_url)
                .context("Failed to build the route guard")?;

            let suggest = SuggestClient::new(&suggest_url)
                .context("Failed to build the suggestion service client")?;

            atingi::new(port, route_guard, suggest, &frontend_url).await?;
        }
    }

    Ok(())
}
