use bson::{doc, Bson, Document};

/// Storage query predicate.
///
/// Renders to a MongoDB filter document and can also be evaluated directly
/// against a serialised record, which keeps the in-memory store and the
/// Mongo store answering the same question.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Eq { field: String, value: Bson },
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Conjoin, collapsing `All` so scoped filters stay readable in logs.
    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::All, f) | (f, Filter::All) => f,
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            }
            (Filter::And(mut left), f) => {
                left.push(f);
                Filter::And(left)
            }
            (f, g) => Filter::And(vec![f, g]),
        }
    }

    pub fn to_document(&self) -> Document {
        match self {
            Filter::All => Document::new(),
            Filter::Eq { field, value } => {
                let mut d = Document::new();
                d.insert(field.clone(), value.clone());
                d
            }
            Filter::And(filters) if filters.is_empty() => Document::new(),
            Filter::And(filters) => {
                let clauses: Vec<Document> = filters.iter().map(Filter::to_document).collect();
                doc! { "$and": clauses }
            }
            // an empty disjunction matches nothing
            Filter::Or(filters) if filters.is_empty() => doc! { "$nor": [{}] },
            Filter::Or(filters) => {
                let clauses: Vec<Document> = filters.iter().map(Filter::to_document).collect();
                doc! { "$or": clauses }
            }
        }
    }

    pub fn matches(&self, record: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq { field, value } => lookup(record, field) == Some(value),
            Filter::And(filters) => filters.iter().all(|f| f.matches(record)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(record)),
        }
    }
}

fn lookup<'a>(record: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let mut current = record.get(parts.next()?)?;
    for part in parts {
        current = current.as_document()?.get(part)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_with_all_is_identity() {
        let f = Filter::eq("id", "a");
        assert_eq!(Filter::All.and(f.clone()), f);
        assert_eq!(f.clone().and(Filter::All), f);
    }

    #[test]
    fn renders_mongo_operators() {
        let f = Filter::eq("name", "root").and(Filter::Or(vec![
            Filter::eq("id", "a"),
            Filter::eq("id", "b"),
        ]));
        assert_eq!(
            f.to_document(),
            doc! { "$and": [ { "name": "root" }, { "$or": [ { "id": "a" }, { "id": "b" } ] } ] }
        );
    }

    #[test]
    fn evaluates_against_records() {
        let record = doc! { "id": "a", "name": "Acme", "owner": { "id": "z" } };
        assert!(Filter::eq("id", "a").matches(&record));
        assert!(!Filter::eq("id", "b").matches(&record));
        assert!(Filter::eq("owner.id", "z").matches(&record));
        assert!(!Filter::eq("missing", "a").matches(&record));
        assert!(!Filter::Or(vec![]).matches(&record));
        assert!(Filter::And(vec![]).matches(&record));
    }
}
