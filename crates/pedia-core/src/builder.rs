//! Client-side encoder for list queries.
//!
//! Search parameters (clusters, namespaces, paging, ownership) are encoded as
//! requirements on well-known label keys so they travel inside an ordinary
//! label selector:
//!
//! ```
//! use pedia_core::ListOptionsBuilder;
//!
//! let opts = ListOptionsBuilder::new()
//!     .clusters(["cluster01", "cluster02"])
//!     .namespaces(["kube-system"])
//!     .options();
//! assert_eq!(
//!     opts.label_selector,
//!     "search.clusterpedia.io/clusters in (cluster01,cluster02),search.clusterpedia.io/namespaces=kube-system"
//! );
//! ```

use std::collections::BTreeSet;

use crate::constants::*;
use crate::selector::{Operator, Requirement, Selector};
use crate::types::ListOptions;

#[derive(Debug, Clone, Default)]
pub struct ListOptionsBuilder {
    label_selector: Selector,
    field_selector: Selector,
    continue_token: String,
}

impl ListOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clusters<I, S>(self, clusters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_in(SEARCH_LABEL_CLUSTERS, clusters)
    }

    pub fn namespaces<I, S>(self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_in(SEARCH_LABEL_NAMESPACES, namespaces)
    }

    pub fn names<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_in(SEARCH_LABEL_NAMES, names)
    }

    pub fn fuzzy_name(self, fragment: &str) -> Self {
        self.add_in(SEARCH_LABEL_FUZZY_NAME, [fragment])
    }

    /// Page size.
    pub fn size(self, limit: i64) -> Self {
        self.add_equals(SEARCH_LABEL_LIMIT, &limit.to_string())
    }

    /// Page start offset.
    pub fn offset(self, offset: i64) -> Self {
        self.add_equals(SEARCH_LABEL_OFFSET, &offset.to_string())
    }

    /// Sort by `field`; repeated calls accumulate columns.
    pub fn order_by(self, field: &str, desc: bool) -> Self {
        let column = if desc {
            format!("{field}{ORDER_BY_DESC}")
        } else {
            field.to_string()
        };
        self.add_in(SEARCH_LABEL_ORDER_BY, [column])
    }

    /// Ask for the number of items left after the returned page.
    pub fn remaining_count(self) -> Self {
        self.add_equals(SEARCH_LABEL_WITH_REMAINING_COUNT, "true")
    }

    pub fn owner_uid(self, uid: &str) -> Self {
        self.add_in(SEARCH_LABEL_OWNER_UID, [uid])
    }

    pub fn owner_name(self, name: &str) -> Self {
        self.add_equals(SEARCH_LABEL_OWNER_NAME, name)
    }

    /// Number of ownership hops between the listed objects and the named
    /// owner.
    pub fn owner_seniority(self, seniority: u32) -> Self {
        self.add_equals(SEARCH_LABEL_OWNER_SENIORITY, &seniority.to_string())
    }

    /// Add plain label requirements.
    pub fn selector<I>(mut self, requirements: I) -> Self
    where
        I: IntoIterator<Item = Requirement>,
    {
        for requirement in requirements {
            self.label_selector.add(requirement);
        }
        self
    }

    /// Add field requirements (`status.phase=Running`).
    pub fn field_selector<I>(mut self, requirements: I) -> Self
    where
        I: IntoIterator<Item = Requirement>,
    {
        for requirement in requirements {
            self.field_selector.add(requirement);
        }
        self
    }

    pub fn continue_token(mut self, token: &str) -> Self {
        self.continue_token = token.to_string();
        self
    }

    pub fn options(&self) -> ListOptions {
        ListOptions {
            label_selector: self.label_selector.to_string(),
            field_selector: self.field_selector.to_string(),
            limit: 0,
            continue_token: self.continue_token.clone(),
        }
    }

    fn add_in<I, S>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if !values.is_empty() {
            self.label_selector
                .add(Requirement::unchecked(key, Operator::In, values));
        }
        self
    }

    fn add_equals(mut self, key: &str, value: &str) -> Self {
        let values = BTreeSet::from([value.to_string()]);
        self.label_selector
            .add(Requirement::unchecked(key, Operator::Equals, values));
        self
    }
}
