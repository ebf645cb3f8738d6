//! Sign-in, profile and avatar commands.

use super::AppState;
use crate::{models::user::User, services::avatar};
use anyhow::{Context, Result, bail};

/// Profile fields given on the command line; `None` keeps the current value.
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub address: Option<String>,
    pub subscription: Option<String>,
}

impl ProfileChanges {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.bio.is_none()
            && self.address.is_none()
            && self.subscription.is_none()
    }
}

pub async fn login(
    state: &AppState,
    token: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> Result<String> {
    let token = match (token, email, password) {
        (Some(token), _, _) => token,
        (None, Some(email), Some(password)) => {
            let session = state
                .account()
                .login(&email, &password)
                .await
                .context("signing in")?;
            session.token().to_string()
        }
        _ => bail!("pass --token, or --email with --password"),
    };
    if token.trim().is_empty() {
        bail!("token is empty");
    }

    state
        .tokens
        .sign_in(token)
        .await
        .context("storing session token")?;
    Ok(format!(
        "Signed in; session stored at {}",
        state.tokens.path().display()
    ))
}

pub async fn logout(state: &AppState) -> Result<String> {
    let removed = state
        .tokens
        .sign_out()
        .await
        .context("clearing session token")?;
    Ok(if removed {
        "Signed out".to_string()
    } else {
        "No session to sign out of".to_string()
    })
}

pub async fn whoami(state: &AppState) -> Result<String> {
    let user = state.account().me().await.context("fetching account")?;
    Ok(describe_user(&user))
}

pub async fn profile(state: &AppState, changes: ProfileChanges) -> Result<String> {
    if changes.is_empty() {
        bail!("nothing to change; pass at least one profile field");
    }

    let account = state.account();
    let current = account.me().await.context("fetching account")?;
    let mut update = current.to_update();
    if let Some(name) = changes.name {
        update.name = name;
    }
    if let Some(email) = changes.email {
        update.email = email;
    }
    if let Some(bio) = changes.bio {
        update.bio = bio;
    }
    if let Some(address) = changes.address {
        update.address = address;
    }
    if let Some(subscription) = changes.subscription {
        update.subscription_type = subscription;
    }

    let user = account
        .update_me(&update)
        .await
        .context("saving profile")?;
    Ok(format!("Profile updated\n{}", describe_user(&user)))
}

pub async fn public_video(state: &AppState) -> Result<String> {
    let url = state
        .account()
        .public_video()
        .await
        .context("fetching public video")?;
    Ok(url.unwrap_or_else(|| "No public video available".to_string()))
}

pub fn avatar(name: Option<&str>, email: Option<&str>) -> String {
    format!(
        "{} {}",
        avatar::initials(name),
        avatar::avatar_color(name, email)
    )
}

fn describe_user(user: &User) -> String {
    let mut lines = vec![format!("{} <{}> (id {})", user.name, user.email, user.id)];
    match user.avatar_url() {
        Some(url) => lines.push(format!("avatar: {}", url)),
        None => lines.push(format!(
            "avatar: {}",
            avatar(Some(&user.name), Some(&user.email))
        )),
    }
    if let Some(plan) = user.subscription_type.as_deref().filter(|p| !p.is_empty()) {
        lines.push(format!("subscription: {}", plan));
    }
    if let Some(bio) = user.bio.as_deref().filter(|b| !b.is_empty()) {
        lines.push(format!("bio: {}", bio));
    }
    if let Some(address) = user.address.as_deref().filter(|a| !a.is_empty()) {
        lines.push(format!("address: {}", address));
    }
    if let Some(created) = user.created_at {
        lines.push(format!("member since {}", created.format("%Y-%m-%d")));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avatar_line_has_initials_and_colour() {
        let line = avatar(Some("ab"), None);
        assert_eq!(line, "A bg-red-500 (#ef4444)");
        assert!(avatar(None, None).starts_with("U "));
    }

    #[test]
    fn describe_falls_back_to_generated_avatar() {
        let user = User {
            id: "7".into(),
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            bio: None,
            address: Some(String::new()),
            subscription_type: Some("pro".into()),
            profile_picture: None,
            created_at: None,
        };
        let text = describe_user(&user);
        assert!(text.starts_with("Ada Lovelace <ada@example.com> (id 7)"));
        assert!(text.contains("avatar: AL bg-"));
        assert!(text.contains("subscription: pro"));
        assert!(!text.contains("address"));
    }
}
