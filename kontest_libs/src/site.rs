use serde::{Deserialize, Serialize};
use std::fmt;

/// Contest sites the feed knows how to filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Site {
    CodeForces,
    AtCoder,
    CsAcademy,
    CodeChef,
    HackerRank,
    HackerEarth,
    LeetCode,
    Toph,
}

impl Site {
    pub const ALL: [Site; 8] = [
        Site::CodeForces,
        Site::AtCoder,
        Site::CsAcademy,
        Site::CodeChef,
        Site::HackerRank,
        Site::HackerEarth,
        Site::LeetCode,
        Site::Toph,
    ];

    /// Display name, also the value carried in `ContestRecord::site`.
    pub fn name(&self) -> &'static str {
        match self {
            Site::CodeForces => "CodeForces",
            Site::AtCoder => "AtCoder",
            Site::CsAcademy => "CS Academy",
            Site::CodeChef => "CodeChef",
            Site::HackerRank => "HackerRank",
            Site::HackerEarth => "HackerEarth",
            Site::LeetCode => "LeetCode",
            Site::Toph => "Toph",
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            Site::CodeForces => "CF",
            Site::AtCoder => "AC",
            Site::CsAcademy => "CSA",
            Site::CodeChef => "CC",
            Site::HackerRank => "HR",
            Site::HackerEarth => "HE",
            Site::LeetCode => "LC",
            Site::Toph => "TOPH",
        }
    }

    pub fn from_name(name: &str) -> Option<Site> {
        Site::ALL
            .into_iter()
            .find(|site| site.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Abbreviation for a site display name, or the name itself for sites outside the catalogue.
pub fn abbreviation_of(site: &str) -> &str {
    match Site::from_name(site) {
        Some(known) => known.abbreviation(),
        None => site,
    }
}

/// Map the host a listing points at to the site display name.
pub fn site_from_location(location: &str) -> String {
    match location.trim().to_lowercase().as_str() {
        "codingninjas.com/codestudio" | "codingninjas.com" => "Coding Ninjas",
        "yukicoder.me" => "Yuki Coder",
        "hackerearth.com" => Site::HackerEarth.name(),
        "hackerrank.com" => Site::HackerRank.name(),
        "atcoder.jp" => Site::AtCoder.name(),
        "codeforces.com" => Site::CodeForces.name(),
        "leetcode.com" => Site::LeetCode.name(),
        "codechef.com" => Site::CodeChef.name(),
        "toph.co" | "toph.com" => Site::Toph.name(),
        "csacademy.com" => Site::CsAcademy.name(),
        _ => location,
    }
    .to_string()
}
