use std::collections::BTreeMap;

use serde_json::Value;

/// Opaque row-set element as returned by the relational accessor.
pub type Record = serde_json::Map<String, Value>;

pub const DEFAULT_LIST_SKIP: u64 = 0;
pub const DEFAULT_LIST_LIMIT: u64 = 10;

/// Static description of one cached entity: its table, identity column,
/// column set, substring-searchable columns and (for user-owned rows) the
/// owner scope column. The cache namespace is `name`, which may differ from
/// the table when the SQL name would collide with a keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityKind {
    pub name: &'static str,
    pub table: &'static str,
    pub id_column: &'static str,
    pub columns: &'static [&'static str],
    pub search_columns: &'static [&'static str],
    pub scope_column: Option<&'static str>,
    pub order_column: &'static str,
}

impl EntityKind {
    pub const USER: EntityKind = EntityKind {
        name: "user",
        table: "users",
        id_column: "user_id",
        columns: &[
            "user_id",
            "name",
            "display_name",
            "email",
            "gender",
            "created_at",
            "updated_at",
        ],
        search_columns: &["name", "display_name", "email"],
        scope_column: None,
        order_column: "name",
    };

    pub const PRODUCT: EntityKind = EntityKind {
        name: "product",
        table: "product",
        id_column: "product_id",
        columns: &[
            "product_id",
            "name",
            "price",
            "description",
            "specifications",
            "image",
            "stock",
            "is_featured",
            "created_at",
            "updated_at",
        ],
        search_columns: &["name", "description", "specifications"],
        scope_column: None,
        order_column: "name",
    };

    pub const CATEGORY: EntityKind = EntityKind {
        name: "category",
        table: "category",
        id_column: "category_id",
        columns: &[
            "category_id",
            "name",
            "description",
            "image",
            "created_at",
            "updated_at",
        ],
        search_columns: &["name", "description"],
        scope_column: None,
        order_column: "name",
    };

    pub const CART: EntityKind = EntityKind {
        name: "cart",
        table: "cart",
        id_column: "cart_id",
        columns: &[
            "cart_id",
            "product_id",
            "category_id",
            "quantity",
            "created_at",
            "updated_at",
        ],
        search_columns: &[],
        scope_column: Some("user_id"),
        order_column: "created_at",
    };

    pub const ORDER: EntityKind = EntityKind {
        name: "order",
        table: "orders",
        id_column: "order_id",
        columns: &["order_id", "total_price", "created_at", "updated_at"],
        search_columns: &[],
        scope_column: Some("user_id"),
        order_column: "created_at",
    };

    pub const PAYMENT: EntityKind = EntityKind {
        name: "payment",
        table: "payment",
        id_column: "payment_id",
        columns: &[
            "payment_id",
            "payment_name",
            "payment_description",
            "amount",
            "created_at",
            "updated_at",
        ],
        search_columns: &["payment_name", "payment_description"],
        scope_column: Some("user_id"),
        order_column: "created_at",
    };

    pub const WISHLIST: EntityKind = EntityKind {
        name: "wishlist",
        table: "wishlist",
        id_column: "wishlist_id",
        columns: &[
            "wishlist_id",
            "product_id",
            "category_id",
            "created_at",
            "updated_at",
        ],
        search_columns: &[],
        scope_column: Some("user_id"),
        order_column: "created_at",
    };

    pub const ADDRESS: EntityKind = EntityKind {
        name: "address",
        table: "address",
        id_column: "address_id",
        columns: &[
            "address_id",
            "address_type",
            "address_line_1",
            "address_line_2",
            "city",
            "state",
            "country",
            "pincode",
            "mobile",
            "created_at",
            "updated_at",
        ],
        search_columns: &[
            "address_type",
            "address_line_1",
            "address_line_2",
            "city",
            "state",
            "country",
            "pincode",
            "mobile",
        ],
        scope_column: Some("user_id"),
        order_column: "address_type",
    };

    pub const CONTACT: EntityKind = EntityKind {
        name: "contact",
        table: "contact",
        id_column: "contact_id",
        columns: &[
            "contact_id",
            "fname",
            "lname",
            "email",
            "message",
            "created_at",
            "updated_at",
        ],
        search_columns: &["fname", "lname", "email", "message"],
        scope_column: None,
        order_column: "created_at",
    };

    pub const ALL: &'static [&'static EntityKind] = &[
        &Self::USER,
        &Self::PRODUCT,
        &Self::CATEGORY,
        &Self::CART,
        &Self::ORDER,
        &Self::PAYMENT,
        &Self::WISHLIST,
        &Self::ADDRESS,
        &Self::CONTACT,
    ];

    pub fn is_known_column(&self, column: &str) -> bool {
        self.columns.contains(&column)
    }

    /// True for entities whose rows belong to a single owner.
    pub fn is_scoped(&self) -> bool {
        self.scope_column.is_some()
    }
}

/// List-query filters as they arrive from the edge. `None` fields fall back
/// to the documented defaults when the query runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilter {
    pub search_key: Option<String>,
    pub select: Option<Vec<String>>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

impl ListFilter {
    pub fn skip_or_default(&self) -> u64 {
        self.skip.unwrap_or(DEFAULT_LIST_SKIP)
    }

    pub fn limit_or_default(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_LIST_LIMIT)
    }
}

/// Sparse patch where presence is explicit: a column is updated iff an entry
/// exists for it, so empty strings, zero and `false` are legitimate new
/// values.
#[derive(Debug, Clone, Default)]
pub struct Patch {
    fields: BTreeMap<String, Value>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(column.into(), value.into());
        self
    }

    /// Builds a patch from a request body, keeping only entries for columns
    /// the entity actually has (identity and bookkeeping columns excluded).
    pub fn from_record(entity: &EntityKind, record: Record) -> Self {
        let mut fields = BTreeMap::new();
        for (column, value) in record {
            if entity.is_known_column(&column)
                && column != entity.id_column
                && column != "created_at"
                && column != "updated_at"
            {
                fields.insert(column, value);
            }
        }
        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_record(self) -> Record {
        self.fields.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn patch_keeps_falsy_values() {
        let patch = Patch::new()
            .set("name", "")
            .set("stock", 0)
            .set("is_featured", false);
        let record = patch.into_record();

        assert_eq!(record.get("name"), Some(&json!("")));
        assert_eq!(record.get("stock"), Some(&json!(0)));
        assert_eq!(record.get("is_featured"), Some(&json!(false)));
    }

    #[test]
    fn patch_from_record_drops_unknown_and_bookkeeping_columns() {
        let mut body = Record::new();
        body.insert("name".to_string(), json!("abcde"));
        body.insert("category_id".to_string(), json!(7));
        body.insert("created_at".to_string(), json!("2024-01-01"));
        body.insert("not_a_column".to_string(), json!("x"));

        let patch = Patch::from_record(&EntityKind::CATEGORY, body);
        let record = patch.into_record();

        assert_eq!(record.len(), 1);
        assert_eq!(record.get("name"), Some(&json!("abcde")));
    }

    #[test]
    fn list_filter_defaults() {
        let filter = ListFilter::default();
        assert_eq!(filter.skip_or_default(), 0);
        assert_eq!(filter.limit_or_default(), 10);
    }
}
