use crate::model::Contest;
use crate::site::abbreviation_of;
use unicode_normalization::UnicodeNormalization;

fn normalize(s: &str) -> String {
    s.nfkc().collect::<String>().to_lowercase()
}

/// Whether `contest` mentions `query` in its name, site, site abbreviation or url.
pub fn matches(contest: &Contest, query: &str) -> bool {
    let query = normalize(query);
    [
        contest.name.as_str(),
        contest.site.as_str(),
        abbreviation_of(&contest.site),
        contest.url.as_str(),
    ]
    .iter()
    .any(|field| normalize(field).contains(&query))
}

/// Case-insensitive substring filter over the backup list. An empty query keeps everything.
pub fn filter_contests(backup: &[Contest], query: &str) -> Vec<Contest> {
    if query.is_empty() {
        return backup.to_vec();
    }

    backup
        .iter()
        .filter(|contest| matches(contest, query))
        .cloned()
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::test::contest;
    use chrono::{TimeZone, Utc};

    fn contests() -> Vec<Contest> {
        let start = Utc.with_ymd_and_hms(2024, 7, 30, 18, 30, 0).unwrap();
        vec![
            contest("AtCoder Beginner Contest 365", "AtCoder", start, 2),
            contest("Codeforces Round 960", "CodeForces", start, 2),
            contest("Weekly Contest 408", "LeetCode", start, 2),
            contest("Ｓｔａｒｔｅｒｓ 142", "CodeChef", start, 2),
        ]
    }

    fn names(contests: &[Contest]) -> Vec<&str> {
        contests.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_empty_query_is_identity() {
        assert_eq!(filter_contests(&contests(), ""), contests());
    }

    #[test]
    fn test_matches_name_site_and_url() {
        let contests = contests();
        assert_eq!(
            names(&filter_contests(&contests, "round")),
            vec!["Codeforces Round 960"]
        );
        assert_eq!(
            names(&filter_contests(&contests, "leetcode")),
            vec!["Weekly Contest 408"]
        );
        assert_eq!(
            names(&filter_contests(&contests, "lc")),
            vec!["Weekly Contest 408"]
        );
        assert_eq!(
            names(&filter_contests(&contests, "example.com/weekly")),
            vec!["Weekly Contest 408"]
        );
        assert!(filter_contests(&contests, "icpc").is_empty());
    }

    #[test]
    fn test_full_width_text_matches() {
        let found = filter_contests(&contests(), "starters");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].site, "CodeChef");
    }

    #[test]
    fn test_filter_is_idempotent() {
        let contests = contests();
        for query in ["", "contest", "AT", "408", "zzz"] {
            let once = filter_contests(&contests, query);
            assert_eq!(filter_contests(&once, query), once);
        }
    }
}
