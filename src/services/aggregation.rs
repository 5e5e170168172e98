//! In-process equivalents of the tag and ranking pipelines, for backends
//! without aggregation support.

use std::collections::HashMap;

use crate::models::{RankedStore, Review, Store, TagCount};

/// Every tag occurrence counts, including repeats within one store.
/// Sorted by count descending, then tag ascending.
pub fn tally_tags<'a, I>(tag_lists: I) -> Vec<TagCount>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut counts: HashMap<&str, i64> = HashMap::new();

    for tags in tag_lists {
        for tag in tags {
            *counts.entry(tag.as_str()).or_insert(0) += 1;
        }
    }

    let mut tally: Vec<TagCount> = counts
        .into_iter()
        .map(|(tag, count)| TagCount { tag: tag.to_string(), count })
        .collect();

    tally.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    tally
}

/// Stores with at least two reviews, annotated with their mean rating and
/// ordered best first. Stores with zero or one review never appear.
pub fn rank_top_stores(stores: &[Store], reviews: &[Review], limit: usize) -> Vec<RankedStore> {
    let mut by_store: HashMap<_, Vec<Review>> = HashMap::new();
    for review in reviews {
        by_store.entry(review.store).or_default().push(review.clone());
    }

    let mut ranked: Vec<RankedStore> = stores
        .iter()
        .filter_map(|store| {
            let id = store.id?;
            let store_reviews = by_store.remove(&id)?;
            if store_reviews.len() < 2 {
                return None;
            }

            let total: f64 = store_reviews.iter().map(|r| f64::from(r.rating)).sum();
            let average_rating = total / store_reviews.len() as f64;

            Some(RankedStore {
                id,
                name: store.name.clone(),
                slug: store.slug.clone(),
                photo: store.photo.clone(),
                reviews: store_reviews,
                average_rating,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.average_rating.total_cmp(&a.average_rating));
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Location;
    use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};

    fn store(name: &str) -> Store {
        Store {
            id: Some(ObjectId::new()),
            name: name.to_string(),
            slug: name.to_lowercase(),
            description: String::new(),
            tags: vec![],
            created: BsonDateTime::now(),
            location: Location::point(0.0, 0.0, "somewhere"),
            photo: None,
            author: ObjectId::new(),
        }
    }

    fn review(store: &Store, rating: i32) -> Review {
        Review {
            id: Some(ObjectId::new()),
            author: ObjectId::new(),
            store: store.id.unwrap(),
            text: "ok".to_string(),
            rating,
            created: BsonDateTime::now(),
        }
    }

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_tally_counts_every_occurrence() {
        let lists = vec![tags(&["a", "b"]), tags(&["a"]), tags(&["b", "b"])];
        let tally = tally_tags(lists.iter().map(|l| l.as_slice()));

        assert_eq!(
            tally,
            vec![
                TagCount { tag: "b".into(), count: 3 },
                TagCount { tag: "a".into(), count: 2 },
            ]
        );
    }

    #[test]
    fn test_tally_ties_break_alphabetically() {
        let lists = vec![tags(&["wifi", "family"])];
        let tally = tally_tags(lists.iter().map(|l| l.as_slice()));
        assert_eq!(tally[0].tag, "family");
        assert_eq!(tally[1].tag, "wifi");
    }

    #[test]
    fn test_rank_excludes_stores_with_one_or_no_reviews() {
        let none = store("None");
        let one = store("One");
        let two = store("Two");
        let three = store("Three");

        let reviews = vec![
            review(&one, 5),
            review(&two, 3),
            review(&two, 4),
            review(&three, 5),
            review(&three, 4),
            review(&three, 5),
        ];

        let ranked = rank_top_stores(&[none, one, two, three], &reviews, 10);
        let names: Vec<&str> = ranked.iter().map(|r| r.name.as_str()).collect();

        assert_eq!(names, vec!["Three", "Two"]);
        assert!((ranked[0].average_rating - 14.0 / 3.0).abs() < 1e-9);
        assert!((ranked[1].average_rating - 3.5).abs() < 1e-9);
        assert_eq!(ranked[0].reviews.len(), 3);
    }

    #[test]
    fn test_rank_respects_limit() {
        let stores: Vec<Store> = (0..12).map(|i| store(&format!("S{}", i))).collect();
        let reviews: Vec<Review> = stores
            .iter()
            .flat_map(|s| vec![review(s, 4), review(s, 5)])
            .collect();

        assert_eq!(rank_top_stores(&stores, &reviews, 10).len(), 10);
    }
}
