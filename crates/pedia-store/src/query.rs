//! Structured List queries.
//!
//! A [`ListQuery`] is what the engine consumes. It is usually decoded from
//! wire [`ListOptions`]: requirements on the well-known search keys are
//! lifted out of the label selector into dedicated fields and every other
//! requirement stays a plain label requirement.

use std::cmp::Ordering;

use pedia_core::constants::*;
use pedia_core::{ListOptions, Operator, Requirement, Selector, SelectorError};

use crate::record::ResourceRecord;

/// Column a List result can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderColumn {
    Cluster,
    Namespace,
    Name,
    CreatedAt,
    ResourceVersion,
}

impl OrderColumn {
    fn parse(column: &str) -> Option<Self> {
        match column {
            "cluster" => Some(Self::Cluster),
            "namespace" => Some(Self::Namespace),
            "name" => Some(Self::Name),
            "created_at" => Some(Self::CreatedAt),
            "resource_version" => Some(Self::ResourceVersion),
            _ => None,
        }
    }

    fn compare(self, a: &ResourceRecord, b: &ResourceRecord) -> Ordering {
        match self {
            Self::Cluster => a.cluster.cmp(&b.cluster),
            Self::Namespace => a.namespace.cmp(&b.namespace),
            Self::Name => a.name.cmp(&b.name),
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::ResourceVersion => compare_resource_versions(&a.resource_version, &b.resource_version),
        }
    }
}

/// Numeric resource versions compare numerically, anything else as text.
fn compare_resource_versions(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: OrderColumn,
    pub desc: bool,
}

impl OrderBy {
    /// Parse `name` or `name_desc`.
    pub fn parse(value: &str) -> Result<Self, SelectorError> {
        let (column, desc) = match value.strip_suffix(ORDER_BY_DESC) {
            Some(column) => (column, true),
            None => (value, false),
        };
        let column = OrderColumn::parse(column)
            .ok_or_else(|| SelectorError::UnsupportedOrderBy(value.to_string()))?;
        Ok(Self { column, desc })
    }
}

/// Sort records by the order-by keys, first key most significant.
pub fn compare_records(order: &[OrderBy], a: &ResourceRecord, b: &ResourceRecord) -> Ordering {
    for key in order {
        let ordering = key.column.compare(a, b);
        let ordering = if key.desc { ordering.reverse() } else { ordering };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Everything a List call can ask for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    /// Empty means every cluster.
    pub clusters: Vec<String>,
    /// Empty means every namespace.
    pub namespaces: Vec<String>,
    pub names: Vec<String>,
    pub fuzzy_names: Vec<String>,
    pub owner_uids: Vec<String>,
    pub owner_name: Option<String>,
    pub owner_seniority: u32,
    pub label_selector: Selector,
    pub field_selector: Selector,
    pub order_by: Vec<OrderBy>,
    /// Page size; `<= 0` disables paging.
    pub limit: i64,
    pub continue_token: Option<String>,
    pub with_remaining_count: bool,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode wire options, failing on malformed selectors and unknown
    /// search keys.
    pub fn from_options(options: &ListOptions) -> Result<Self, SelectorError> {
        let labels = Selector::parse(&options.label_selector)?;
        let mut query = ListQuery {
            field_selector: Selector::parse(&options.field_selector)?,
            limit: options.limit,
            continue_token: (!options.continue_token.is_empty())
                .then(|| options.continue_token.clone()),
            ..Default::default()
        };

        for requirement in labels.requirements() {
            match requirement.key() {
                SEARCH_LABEL_CLUSTERS => query.clusters = positive_values(requirement)?,
                SEARCH_LABEL_NAMESPACES => query.namespaces = positive_values(requirement)?,
                SEARCH_LABEL_NAMES => query.names = positive_values(requirement)?,
                SEARCH_LABEL_FUZZY_NAME => query.fuzzy_names = positive_values(requirement)?,
                SEARCH_LABEL_OWNER_UID => query.owner_uids = positive_values(requirement)?,
                SEARCH_LABEL_OWNER_NAME => {
                    query.owner_name = Some(single_value(requirement)?.to_string());
                }
                SEARCH_LABEL_OWNER_SENIORITY => {
                    query.owner_seniority = parse_integer(requirement)?;
                }
                SEARCH_LABEL_LIMIT => query.limit = parse_integer(requirement)?,
                SEARCH_LABEL_OFFSET => {
                    let offset: i64 = parse_integer(requirement)?;
                    query.continue_token = Some(offset.to_string());
                }
                SEARCH_LABEL_ORDER_BY => {
                    query.order_by = positive_values(requirement)?
                        .iter()
                        .map(|v| OrderBy::parse(v))
                        .collect::<Result<_, _>>()?;
                }
                SEARCH_LABEL_WITH_REMAINING_COUNT => {
                    query.with_remaining_count = parse_flag(requirement)?;
                }
                // Offsets are always resumable, so the flag carries no extra meaning.
                SEARCH_LABEL_WITH_CONTINUE => {
                    parse_flag(requirement)?;
                }
                key if key.starts_with(SEARCH_LABEL_PREFIX) => {
                    return Err(SelectorError::UnknownSearchKey(key.to_string()));
                }
                _ => query.label_selector.add(requirement.clone()),
            }
        }
        Ok(query)
    }

    pub fn clusters<I, S>(mut self, clusters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.clusters = clusters.into_iter().map(Into::into).collect();
        self
    }

    pub fn namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.namespaces = namespaces.into_iter().map(Into::into).collect();
        self
    }

    pub fn owner_name(mut self, name: &str, seniority: u32) -> Self {
        self.owner_name = Some(name.to_string());
        self.owner_seniority = seniority;
        self
    }

    pub fn page(mut self, limit: i64, continue_token: Option<&str>) -> Self {
        self.limit = limit;
        self.continue_token = continue_token.map(str::to_string);
        self
    }
}

/// Values of an `=`/`in` requirement; negative operators make no sense on
/// search keys.
fn positive_values(requirement: &Requirement) -> Result<Vec<String>, SelectorError> {
    match requirement.operator() {
        Operator::Equals | Operator::In => Ok(requirement.values().iter().cloned().collect()),
        _ => Err(SelectorError::InvalidOperator(requirement.to_string())),
    }
}

fn single_value(requirement: &Requirement) -> Result<&str, SelectorError> {
    match requirement.operator() {
        Operator::Equals | Operator::In => requirement.single_value().ok_or_else(|| {
            SelectorError::ValueCount {
                key: requirement.key().to_string(),
                operator: requirement.operator(),
                expected: "exactly one",
                got: requirement.values().len(),
            }
        }),
        _ => Err(SelectorError::InvalidOperator(requirement.to_string())),
    }
}

fn parse_integer<T: std::str::FromStr>(requirement: &Requirement) -> Result<T, SelectorError> {
    let value = single_value(requirement)?;
    value.parse().map_err(|_| SelectorError::InvalidInteger {
        key: requirement.key().to_string(),
        value: value.to_string(),
    })
}

fn parse_flag(requirement: &Requirement) -> Result<bool, SelectorError> {
    match single_value(requirement)? {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(SelectorError::InvalidOperator(requirement.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pedia_core::ListOptionsBuilder;

    #[test]
    fn lifts_search_keys_out_of_the_label_selector() {
        let opts = ListOptionsBuilder::new()
            .clusters(["c1", "c2"])
            .namespaces(["default"])
            .names(["a"])
            .owner_name("web")
            .owner_seniority(2)
            .size(4)
            .offset(8)
            .order_by("name", true)
            .remaining_count()
            .selector([Requirement::equals("app", "web").unwrap()])
            .options();

        let query = ListQuery::from_options(&opts).unwrap();
        assert_eq!(query.clusters, vec!["c1", "c2"]);
        assert_eq!(query.namespaces, vec!["default"]);
        assert_eq!(query.names, vec!["a"]);
        assert_eq!(query.owner_name.as_deref(), Some("web"));
        assert_eq!(query.owner_seniority, 2);
        assert_eq!(query.limit, 4);
        assert_eq!(query.continue_token.as_deref(), Some("8"));
        assert!(query.with_remaining_count);
        assert_eq!(
            query.order_by,
            vec![OrderBy { column: OrderColumn::Name, desc: true }]
        );
        assert_eq!(query.label_selector.to_string(), "app=web");
    }

    #[test]
    fn wire_limit_and_continue_are_used_without_search_keys() {
        let opts = ListOptions {
            label_selector: String::new(),
            field_selector: "status.phase=Running".to_string(),
            limit: 5,
            continue_token: "10".to_string(),
        };
        let query = ListQuery::from_options(&opts).unwrap();
        assert_eq!(query.limit, 5);
        assert_eq!(query.continue_token.as_deref(), Some("10"));
        assert_eq!(query.field_selector.requirements().len(), 1);
        assert!(query.label_selector.is_empty());
    }

    #[test]
    fn rejects_bad_search_keys() {
        let bad = |selector: &str| ListOptions {
            label_selector: selector.to_string(),
            ..Default::default()
        };
        assert!(matches!(
            ListQuery::from_options(&bad("search.clusterpedia.io/bogus=1")),
            Err(SelectorError::UnknownSearchKey(_))
        ));
        assert!(matches!(
            ListQuery::from_options(&bad("search.clusterpedia.io/limit=many")),
            Err(SelectorError::InvalidInteger { .. })
        ));
        assert!(matches!(
            ListQuery::from_options(&bad("search.clusterpedia.io/clusters!=c1")),
            Err(SelectorError::InvalidOperator(_))
        ));
        assert!(matches!(
            ListQuery::from_options(&bad("search.clusterpedia.io/orderby=color")),
            Err(SelectorError::UnsupportedOrderBy(_))
        ));
        assert!(matches!(
            ListQuery::from_options(&bad("search.clusterpedia.io/owner-name in (a,b)")),
            Err(SelectorError::ValueCount { .. })
        ));
        assert!(ListQuery::from_options(&bad("app in (a")).is_err());
    }

    #[test]
    fn order_by_parsing() {
        assert_eq!(
            OrderBy::parse("created_at").unwrap(),
            OrderBy { column: OrderColumn::CreatedAt, desc: false }
        );
        assert_eq!(
            OrderBy::parse("cluster_desc").unwrap(),
            OrderBy { column: OrderColumn::Cluster, desc: true }
        );
        assert!(OrderBy::parse("_desc").is_err());
    }

    #[test]
    fn resource_versions_compare_numerically() {
        assert_eq!(compare_resource_versions("9", "10"), Ordering::Less);
        assert_eq!(compare_resource_versions("b", "a"), Ordering::Greater);
    }
}
