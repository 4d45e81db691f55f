//! Well-known label keys understood by the resource index.
//!
//! List queries travel as a label selector; requirements on these keys are
//! lifted out of the selector and become structured query fields.

/// Prefix shared by every search key.
pub const SEARCH_LABEL_PREFIX: &str = "search.clusterpedia.io/";

pub const SEARCH_LABEL_NAMES: &str = "search.clusterpedia.io/names";
pub const SEARCH_LABEL_FUZZY_NAME: &str = "internalstorage.clusterpedia.io/fuzzy-name";
pub const SEARCH_LABEL_CLUSTERS: &str = "search.clusterpedia.io/clusters";
pub const SEARCH_LABEL_NAMESPACES: &str = "search.clusterpedia.io/namespaces";
pub const SEARCH_LABEL_ORDER_BY: &str = "search.clusterpedia.io/orderby";

pub const SEARCH_LABEL_OWNER_UID: &str = "search.clusterpedia.io/owner-uid";
pub const SEARCH_LABEL_OWNER_SENIORITY: &str = "search.clusterpedia.io/owner-seniority";
pub const SEARCH_LABEL_OWNER_NAME: &str = "search.clusterpedia.io/owner-name";

pub const SEARCH_LABEL_WITH_CONTINUE: &str = "search.clusterpedia.io/with-continue";
pub const SEARCH_LABEL_WITH_REMAINING_COUNT: &str =
    "search.clusterpedia.io/with-remaining-count";

pub const SEARCH_LABEL_LIMIT: &str = "search.clusterpedia.io/limit";
pub const SEARCH_LABEL_OFFSET: &str = "search.clusterpedia.io/offset";

/// Suffix appended to an order-by column to sort descending.
pub const ORDER_BY_DESC: &str = "_desc";
