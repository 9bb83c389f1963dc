//! Generic utilities used across core modules.

/// Case-insensitive substring match of `query` against any of `fields`. Empty query matches.
pub fn matches_query(query: &str, fields: &[&str]) -> bool {
    if query.is_empty() {
        return true;
    }
    let q = query.to_lowercase();
    fields.iter().any(|f| f.to_lowercase().contains(&q))
}

/// Filter items by case-insensitive query matching on the fields returned by `get_fields`.
/// Returns all items when query is empty.
pub fn filter_by_query<'a, T, F>(items: &'a [T], query: &str, get_fields: F) -> Vec<&'a T>
where
    F: Fn(&'a T) -> Vec<&'a str>,
{
    items
        .iter()
        .filter(|item| matches_query(query, &get_fields(*item)))
        .collect()
}

/// Truncate to `max` chars, appending an ellipsis when cut.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_empty_query_returns_all() {
        let items = vec!["a", "b", "c"];
        let out = filter_by_query(&items, "", |s| vec![*s]);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn filter_match_any_field() {
        let items = vec![("a", "hello"), ("b", "world")];
        let out = filter_by_query(&items, "orld", |t| vec![t.0, t.1]);
        assert_eq!(out, vec![&("b", "world")]);
    }

    #[test]
    fn filter_case_insensitive() {
        let items = vec!["Hello", "World"];
        let out = filter_by_query(&items, "world", |s| vec![*s]);
        assert_eq!(out, vec![&"World"]);
    }

    #[test]
    fn filter_no_match_returns_empty() {
        let items = vec!["hello", "world"];
        assert!(filter_by_query(&items, "xyz", |s| vec![*s]).is_empty());
    }

    #[test]
    fn truncate_keeps_short_strings() {
        assert_eq!(truncate_chars("abc", 5), "abc");
        assert_eq!(truncate_chars("abcdef", 4), "abc…");
    }
}
