//! Fluent query builder (spec §5).
//!
//! A [`Query`] is built up with `and`/`or` combinators over equality
//! conditions against registered bitmap indices, and is lazy: nothing is
//! evaluated until a terminal method (`execute`, `count`, `first`) is
//! called. Results are always produced in ascending entity-id order.

use roaring::RoaringTreemap;

use crate::bitmap::{and_all, or_all};
use crate::error::Result;
use crate::gigamap::GigaMap;
use crate::indexer::IndexKey;

/// A node in a query's condition tree.
#[derive(Debug, Clone)]
pub enum QueryNode {
    /// Match every entity in the map.
    All,
    /// Match entities indexed under `key` on the index named by the first
    /// field.
    Eq(String, IndexKey),
    /// Match entities matching every sub-node.
    And(Vec<QueryNode>),
    /// Match entities matching any sub-node.
    Or(Vec<QueryNode>),
}

/// A lazily-evaluated query against a [`GigaMap`].
pub struct Query<'a, E: Clone> {
    map: &'a GigaMap<E>,
    node: QueryNode,
    skip: usize,
    limit: Option<usize>,
}

impl<'a, E: Clone> Query<'a, E> {
    /// A query matching every entity in `map`.
    pub fn all(map: &'a GigaMap<E>) -> Self {
        Query { map, node: QueryNode::All, skip: 0, limit: None }
    }

    /// A query matching entities indexed under `key` on `index`.
    pub fn eq(map: &'a GigaMap<E>, index: impl Into<String>, key: IndexKey) -> Self {
        Query { map, node: QueryNode::Eq(index.into(), key), skip: 0, limit: None }
    }

    /// Combine with `other` by AND. Both queries must be against the same
    /// map and carry no skip/limit of their own (set those on the combined
    /// query instead).
    pub fn and(mut self, other: Query<'a, E>) -> Self {
        self.node = match self.node {
            QueryNode::And(mut nodes) => {
                nodes.push(other.node);
                QueryNode::And(nodes)
            }
            node => QueryNode::And(vec![node, other.node]),
        };
        self
    }

    /// Combine with `other` by OR.
    pub fn or(mut self, other: Query<'a, E>) -> Self {
        self.node = match self.node {
            QueryNode::Or(mut nodes) => {
                nodes.push(other.node);
                QueryNode::Or(nodes)
            }
            node => QueryNode::Or(vec![node, other.node]),
        };
        self
    }

    /// Skip the first `n` matches (applied after sorting by ascending id).
    pub fn skip(mut self, n: usize) -> Self {
        self.skip = n;
        self
    }

    /// Yield at most `n` matches.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    fn resolve(&self) -> Result<RoaringTreemap> {
        evaluate(self.map, &self.node)
    }

    fn ordered_ids(&self) -> Result<Vec<u64>> {
        let bitmap = self.resolve()?;
        let mut ids: Vec<u64> = bitmap.iter().collect();
        ids.sort_unstable();
        let ids = ids.into_iter().skip(self.skip);
        Ok(match self.limit {
            Some(n) => ids.take(n).collect(),
            None => ids.collect(),
        })
    }

    /// Number of matches, ignoring `skip`/`limit` (count is over the full
    /// condition, not the paginated view).
    pub fn count(&self) -> Result<u64> {
        Ok(self.resolve()?.len())
    }

    /// First match in ascending id order, if any.
    pub fn first(&self) -> Result<Option<E>> {
        let ids = self.ordered_ids()?;
        Ok(ids.first().and_then(|id| self.map.get(*id)))
    }

    /// Every match, in ascending id order, after applying `skip`/`limit`.
    pub fn execute(&self) -> Result<Vec<E>> {
        Ok(self.ordered_ids()?.into_iter().filter_map(|id| self.map.get(id)).collect())
    }

    /// A human-readable preview of the first `n` matching ids (debugging
    /// aid; does not materialize entities).
    pub fn preview(&self, n: usize) -> Result<String> {
        let ids = self.resolve()?;
        let mut sorted: Vec<u64> = ids.iter().collect();
        sorted.sort_unstable();
        let shown: Vec<String> = sorted.iter().take(n).map(|id| id.to_string()).collect();
        let suffix = if sorted.len() > n { format!(", ... ({} total)", sorted.len()) } else { String::new() };
        Ok(format!("Query[{}]{}", shown.join(", "), suffix))
    }
}

fn evaluate<E: Clone>(map: &GigaMap<E>, node: &QueryNode) -> Result<RoaringTreemap> {
    match node {
        QueryNode::All => {
            let mut bitmap = RoaringTreemap::new();
            for id in map.ids() {
                bitmap.insert(id);
            }
            Ok(bitmap)
        }
        QueryNode::Eq(index, key) => map.ids_matching(index, key),
        QueryNode::And(nodes) => {
            let resolved: Result<Vec<_>> = nodes.iter().map(|n| evaluate(map, n)).collect();
            Ok(and_all(&resolved?))
        }
        QueryNode::Or(nodes) => {
            let resolved: Result<Vec<_>> = nodes.iter().map(|n| evaluate(map, n)).collect();
            Ok(or_all(&resolved?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::FieldIndexer;

    #[derive(Clone, Debug, PartialEq)]
    struct Person {
        city: String,
        age: i64,
    }

    fn sample_map() -> GigaMap<Person> {
        let map = GigaMap::new();
        map.register_index(Box::new(FieldIndexer::property("city", |p: &Person| p.city.clone())));
        map.register_index(Box::new(FieldIndexer::numeric("age", |p: &Person| p.age)));
        map.add(Person { city: "hanoi".into(), age: 30 }).unwrap();
        map.add(Person { city: "hanoi".into(), age: 40 }).unwrap();
        map.add(Person { city: "hue".into(), age: 30 }).unwrap();
        map
    }

    #[test]
    fn eq_query_matches_exact_key() {
        let map = sample_map();
        let results = Query::eq(&map, "city", IndexKey::Str("hanoi".into())).execute().unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn and_narrows_to_intersection() {
        let map = sample_map();
        let q = Query::eq(&map, "city", IndexKey::Str("hanoi".into()))
            .and(Query::eq(&map, "age", IndexKey::I64(30)));
        let results = q.execute().unwrap();
        assert_eq!(results, vec![Person { city: "hanoi".into(), age: 30 }]);
    }

    #[test]
    fn or_widens_to_union() {
        let map = sample_map();
        let q = Query::eq(&map, "city", IndexKey::Str("hue".into()))
            .or(Query::eq(&map, "age", IndexKey::I64(40)));
        assert_eq!(q.count().unwrap(), 2);
    }

    #[test]
    fn skip_and_limit_paginate_ascending_id_order() {
        let map = sample_map();
        let all = Query::all(&map).execute().unwrap();
        let page = Query::all(&map).skip(1).limit(1).execute().unwrap();
        assert_eq!(page, vec![all[1].clone()]);
    }

    #[test]
    fn preview_formats_ids_with_truncation_marker() {
        let map = sample_map();
        let preview = Query::all(&map).preview(1).unwrap();
        assert!(preview.contains("total"));
    }
}
