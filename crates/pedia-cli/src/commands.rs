pub mod encode;
pub mod get;
pub mod init;
pub mod list;

use pedia_core::{ListOptionsBuilder, Selector};

/// Query flags shared by `list` and `encode`.
#[derive(clap::Args, Debug, Default)]
pub struct QueryArgs {
    #[arg(long = "cluster")]
    pub clusters: Vec<String>,
    #[arg(short = 'n', long = "namespace")]
    pub namespaces: Vec<String>,
    #[arg(long = "name")]
    pub names: Vec<String>,
    /// Keep objects whose name contains this fragment
    #[arg(long)]
    pub fuzzy_name: Option<String>,
    /// Label selector, e.g. "app=web,tier in (frontend,backend)"
    #[arg(short = 'l', long)]
    pub selector: Option<String>,
    /// Field selector, e.g. "status.phase=Running"
    #[arg(long)]
    pub field_selector: Option<String>,
    #[arg(long)]
    pub owner_uid: Option<String>,
    #[arg(long)]
    pub owner_name: Option<String>,
    /// Ancestor levels between the object and --owner-name
    #[arg(long, default_value = "0")]
    pub owner_seniority: u32,
    #[arg(long, default_value = "0")]
    pub limit: i64,
    #[arg(long = "continue")]
    pub continue_token: Option<String>,
    /// cluster, namespace, name, created_at or resource_version
    #[arg(long)]
    pub order_by: Option<String>,
    #[arg(long)]
    pub desc: bool,
    #[arg(long)]
    pub remaining_count: bool,
}

impl QueryArgs {
    /// Encode the flags through the list-options builder.
    pub fn builder(&self) -> anyhow::Result<ListOptionsBuilder> {
        let mut builder = ListOptionsBuilder::new()
            .clusters(self.clusters.iter().map(String::as_str))
            .namespaces(self.namespaces.iter().map(String::as_str))
            .names(self.names.iter().map(String::as_str));

        if let Some(fragment) = &self.fuzzy_name {
            builder = builder.fuzzy_name(fragment);
        }
        if let Some(selector) = &self.selector {
            builder = builder.selector(Selector::parse(selector)?.requirements().iter().cloned());
        }
        if let Some(selector) = &self.field_selector {
            builder = builder.field_selector(Selector::parse(selector)?.requirements().iter().cloned());
        }
        if let Some(uid) = &self.owner_uid {
            builder = builder.owner_uid(uid);
        }
        if let Some(name) = &self.owner_name {
            builder = builder.owner_name(name).owner_seniority(self.owner_seniority);
        }
        if self.limit > 0 {
            builder = builder.size(self.limit);
        }
        if let Some(token) = &self.continue_token {
            builder = builder.continue_token(token);
        }
        if let Some(column) = &self.order_by {
            builder = builder.order_by(column, self.desc);
        }
        if self.remaining_count {
            builder = builder.remaining_count();
        }
        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pedia_store::ListQuery;

    #[test]
    fn flags_round_trip_through_the_query_parser() {
        let args = QueryArgs {
            clusters: vec!["c1".into(), "c2".into()],
            namespaces: vec!["default".into()],
            selector: Some("app=web".into()),
            field_selector: Some("status.phase=Running".into()),
            owner_name: Some("web".into()),
            owner_seniority: 1,
            limit: 5,
            continue_token: Some("10".into()),
            order_by: Some("name".into()),
            desc: true,
            ..Default::default()
        };

        let query = ListQuery::from_options(&args.builder().unwrap().options()).unwrap();
        assert_eq!(query.clusters, vec!["c1", "c2"]);
        assert_eq!(query.namespaces, vec!["default"]);
        assert_eq!(query.owner_name.as_deref(), Some("web"));
        assert_eq!(query.owner_seniority, 1);
        assert_eq!(query.limit, 5);
        assert_eq!(query.continue_token.as_deref(), Some("10"));
        assert_eq!(query.label_selector.to_string(), "app=web");
        assert_eq!(query.field_selector.to_string(), "status.phase=Running");
        assert_eq!(query.order_by.len(), 1);
    }

    #[test]
    fn bad_selector_flag_is_an_error() {
        let args = QueryArgs {
            selector: Some("app in (web".into()),
            ..Default::default()
        };
        assert!(args.builder().is_err());
    }
}
