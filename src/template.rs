//! User facing message texts, rendered with minijinja.

use minijinja::Environment;
use minijinja::context;

use crate::entity::Creator;
use crate::service::live_status_service::PlatformObservation;

/// Compiled message templates.
pub struct Templates {
    jinja_env: Environment<'static>,
}

impl Templates {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut jinja_env = Environment::new();

        jinja_env.add_template("live", include_str!("../assets/messages/live.txt"))?;
        jinja_env.add_template("welcome", include_str!("../assets/messages/welcome.txt"))?;
        jinja_env.add_template("subscribed", include_str!("../assets/messages/subscribed.txt"))?;
        jinja_env.add_template(
            "unsubscribed",
            include_str!("../assets/messages/unsubscribed.txt"),
        )?;
        jinja_env.add_template(
            "unsubscribed_all",
            include_str!("../assets/messages/unsubscribed_all.txt"),
        )?;
        jinja_env.add_template(
            "no_subscriptions",
            include_str!("../assets/messages/no_subscriptions.txt"),
        )?;
        jinja_env.add_template(
            "subscriptions",
            include_str!("../assets/messages/subscriptions.txt"),
        )?;
        jinja_env.add_template("help", include_str!("../assets/messages/help.txt"))?;

        Ok(Self { jinja_env })
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String, minijinja::Error> {
        self.jinja_env.get_template(name)?.render(ctx)
    }

    /// Notification sent to subscribers when a creator goes live.
    pub fn live(
        &self,
        creator: &Creator,
        observation: &PlatformObservation,
    ) -> Result<String, minijinja::Error> {
        self.render(
            "live",
            context! {
                name => creator.name,
                icon => observation.icon,
                platform_name => observation.name,
                url => observation.source_url,
            },
        )
    }

    pub fn welcome(&self) -> Result<String, minijinja::Error> {
        self.render("welcome", context! {})
    }

    pub fn subscribed(&self, creator: &Creator) -> Result<String, minijinja::Error> {
        self.render("subscribed", context! { name => creator.name })
    }

    pub fn unsubscribed(&self, creator: &Creator) -> Result<String, minijinja::Error> {
        self.render("unsubscribed", context! { name => creator.name })
    }

    pub fn unsubscribed_all(&self) -> Result<String, minijinja::Error> {
        self.render("unsubscribed_all", context! {})
    }

    /// Lists the followed creators, or explains how to follow one.
    pub fn subscriptions(&self, creators: &[&Creator]) -> Result<String, minijinja::Error> {
        if creators.is_empty() {
            return self.render("no_subscriptions", context! {});
        }
        let names: Vec<&str> = creators.iter().map(|c| c.name.as_str()).collect();
        self.render("subscriptions", context! { names })
    }

    pub fn help(&self) -> Result<String, minijinja::Error> {
        self.render("help", context! {})
    }
}
