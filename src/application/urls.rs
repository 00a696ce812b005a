//! URL reversal for a mounted blog instance.

use chrono_tz::Tz;
use url::Url;

use crate::domain::entities::PostRecord;
use crate::util::timezone;

const REVERSE_BASE: &str = "http://reverse.invalid/";

/// One mounted copy of the blog routes.
///
/// The router injects the namespace of the prefix that matched the request,
/// so links rendered for `/news/...` stay under `/news`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogNamespace {
    pub name: String,
    pub prefix: String,
}

impl BlogNamespace {
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into().trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlogUrls {
    namespace: BlogNamespace,
    timezone: Tz,
}

impl BlogUrls {
    pub fn new(namespace: BlogNamespace, timezone: Tz) -> Self {
        Self {
            namespace,
            timezone,
        }
    }

    pub fn post_list(&self) -> String {
        if self.namespace.prefix.is_empty() {
            "/".to_string()
        } else {
            self.namespace.prefix.clone()
        }
    }

    pub fn archive(&self, year: i32, month: Option<u8>) -> String {
        let year = year.to_string();
        match month {
            Some(month) => self.reverse(&[&year, &format!("{month:02}")]),
            None => self.reverse(&[&year]),
        }
    }

    pub fn post_detail(&self, post: &PostRecord) -> String {
        let date = timezone::local_date(post.date_published, self.timezone);
        self.reverse(&[
            &date.year().to_string(),
            &format!("{:02}", u8::from(date.month())),
            &format!("{:02}", date.day()),
            &post.translation.slug,
        ])
    }

    pub fn author(&self, username: &str) -> String {
        self.reverse(&["author", username])
    }

    pub fn category(&self, slug: &str) -> String {
        self.reverse(&["category", slug])
    }

    pub fn tagged(&self, slug: &str) -> String {
        self.reverse(&["tag", slug])
    }

    /// `path` with a `cursor` query parameter appended.
    pub fn with_cursor(path: &str, cursor: &str) -> String {
        format!("{path}?cursor={cursor}")
    }

    fn reverse(&self, segments: &[&str]) -> String {
        let mut url = Url::parse(REVERSE_BASE).expect("reverse base is a valid URL");
        if let Ok(mut path) = url.path_segments_mut() {
            path.clear();
            path.extend(self.namespace.prefix.split('/').filter(|s| !s.is_empty()));
            path.extend(segments);
        }
        url.path().to_string()
    }
}
