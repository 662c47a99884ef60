//! Job search: filter composition, sorting and pagination.
//!
//! The document store cannot evaluate substring predicates, so the whole
//! pipeline runs in process over resolved [`JobListing`]s: filter, then sort,
//! then slice one page. `total` therefore always counts every filter,
//! including the salary range.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{parse_salary, ExperienceLevel, Job, JobStatus, UserId};

/// Default page size.
pub const DEFAULT_LIMIT: u32 = 10;

/// Minimum page size.
pub const MIN_LIMIT: u32 = 1;

/// Maximum page size.
pub const MAX_LIMIT: u32 = 100;

/// A job with its owner's details resolved for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListing {
    #[serde(flatten)]
    pub job: Job,
    /// Company display name, read from the recruiter's company.
    pub company: String,
    pub logo: String,
    pub recruiter_name: String,
    pub recruiter_profile_picture: String,
    pub application_count: usize,
    pub is_available: bool,
}

/// Result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Creation time, newest first
    #[default]
    Newest,
    /// Creation time, oldest first
    Oldest,
    /// Parsed salary average, highest first
    SalaryHighToLow,
    /// Parsed salary average, lowest first
    SalaryLowToHigh,
}

impl SortOrder {
    /// Unknown values fall back to newest first.
    pub fn from_str_or_default(s: Option<&str>) -> Self {
        match s.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("oldest") => SortOrder::Oldest,
            Some("salary-high-to-low") => SortOrder::SalaryHighToLow,
            Some("salary-low-to-high") => SortOrder::SalaryLowToHigh,
            _ => SortOrder::Newest,
        }
    }
}

/// Raw search parameters, as received in a query string.
///
/// Values stay textual so that malformed input can be treated as "no
/// constraint" instead of failing the request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSearch {
    pub search: Option<String>,
    pub job_type: Option<String>,
    pub experience: Option<String>,
    pub location: Option<String>,
    pub industry: Option<String>,
    pub status: Option<String>,
    pub min_salary: Option<String>,
    pub max_salary: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub recruiter_id: Option<String>,
}

/// Salary bounds. A job matches if its parsed range overlaps the bounds, or
/// equals them exactly when `min == max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SalaryFilter {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl SalaryFilter {
    fn matches(&self, salary: &str) -> bool {
        let Some(range) = parse_salary(salary) else {
            // Unparseable salaries survive only a max-only filter.
            return self.min.is_none();
        };

        match (self.min, self.max) {
            (Some(min), Some(max)) if min == max => range.min == range.max && range.min == min,
            (min, max) => {
                let meets_min = min.map_or(true, |min| range.max >= min);
                let meets_max = max.map_or(true, |max| range.min <= max);
                meets_min && meets_max
            }
        }
    }
}

/// Typed, validated search.
#[derive(Debug, Clone, PartialEq)]
pub struct JobQuery {
    pub text: Option<String>,
    pub job_type: Option<String>,
    pub experience: Option<ExperienceLevel>,
    pub location: Option<String>,
    pub industry: Option<String>,
    pub status: JobStatus,
    pub recruiter_id: Option<UserId>,
    pub salary: Option<SalaryFilter>,
    pub sort: SortOrder,
    pub page: u32,
    pub limit: u32,
}

/// Pagination block returned with every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: usize,
    pub page: u32,
    pub pages: usize,
    pub has_more: bool,
}

/// One page of search results.
#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub jobs: Vec<JobListing>,
    pub pagination: Pagination,
}

/// Clamp a requested page size to the allowed range.
pub fn normalize_limit(limit: Option<u32>, default: u32) -> u32 {
    limit.unwrap_or(default).clamp(MIN_LIMIT, MAX_LIMIT)
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

impl JobSearch {
    /// Compile into a typed query. Blank or malformed values impose no constraint.
    pub fn compile(&self, default_limit: u32) -> JobQuery {
        let parse_f64 = |v: &Option<String>| {
            non_blank(v).and_then(|s| s.parse::<f64>().ok().filter(|f| f.is_finite()))
        };
        let min = parse_f64(&self.min_salary);
        let max = parse_f64(&self.max_salary);
        let salary = (min.is_some() || max.is_some()).then_some(SalaryFilter { min, max });

        JobQuery {
            text: non_blank(&self.search).map(|s| s.to_lowercase()),
            job_type: non_blank(&self.job_type).map(|s| s.to_lowercase()),
            experience: non_blank(&self.experience).and_then(|s| s.parse().ok()),
            location: non_blank(&self.location).map(|s| s.to_lowercase()),
            industry: non_blank(&self.industry).map(|s| s.to_lowercase()),
            status: non_blank(&self.status)
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            recruiter_id: non_blank(&self.recruiter_id).map(UserId::from_string),
            salary,
            sort: SortOrder::from_str_or_default(self.sort.as_deref()),
            page: non_blank(&self.page)
                .and_then(|s| s.parse::<u32>().ok())
                .filter(|p| *p >= 1)
                .unwrap_or(1),
            limit: normalize_limit(
                non_blank(&self.limit).and_then(|s| s.parse::<u32>().ok()),
                default_limit,
            ),
        }
    }
}

impl JobQuery {
    /// All filters combine with AND; the text match is an OR over
    /// title, company and description.
    pub fn matches(&self, listing: &JobListing) -> bool {
        let job = &listing.job;

        if job.status != self.status {
            return false;
        }
        if let Some(recruiter) = &self.recruiter_id {
            if &job.recruiter_id != recruiter {
                return false;
            }
        }
        if let Some(text) = &self.text {
            let hit = contains_ci(&job.title, text)
                || contains_ci(&listing.company, text)
                || contains_ci(&job.description, text);
            if !hit {
                return false;
            }
        }
        if let Some(job_type) = &self.job_type {
            if job.job_type.trim().to_lowercase() != *job_type {
                return false;
            }
        }
        if let Some(experience) = self.experience {
            if job.experience != experience {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if !contains_ci(&job.location, location) {
                return false;
            }
        }
        if let Some(industry) = &self.industry {
            if !contains_ci(&job.industry, industry) {
                return false;
            }
        }
        if let Some(salary) = &self.salary {
            if !salary.matches(&job.salary) {
                return false;
            }
        }
        true
    }

    /// Filter, sort and paginate.
    pub fn run(&self, listings: Vec<JobListing>) -> SearchPage {
        let mut hits: Vec<JobListing> = listings.into_iter().filter(|l| self.matches(l)).collect();
        sort_listings(&mut hits, self.sort);

        let total = hits.len();
        let limit = self.limit.max(MIN_LIMIT) as usize;
        let skip = (self.page.saturating_sub(1) as usize).saturating_mul(limit);
        let jobs: Vec<JobListing> = hits.into_iter().skip(skip).take(limit).collect();

        let pagination = Pagination {
            total,
            page: self.page,
            pages: total.div_ceil(limit),
            has_more: skip + jobs.len() < total,
        };

        SearchPage { jobs, pagination }
    }
}

fn salary_average(job: &Job) -> f64 {
    parse_salary(&job.salary).map_or(0.0, |s| s.average)
}

fn newest_first(a: &DateTime<Utc>, b: &DateTime<Utc>) -> Ordering {
    b.cmp(a)
}

fn sort_listings(listings: &mut [JobListing], order: SortOrder) {
    match order {
        SortOrder::Newest => {
            listings.sort_by(|a, b| newest_first(&a.job.created_at, &b.job.created_at))
        }
        SortOrder::Oldest => listings.sort_by(|a, b| a.job.created_at.cmp(&b.job.created_at)),
        SortOrder::SalaryHighToLow => listings.sort_by(|a, b| {
            salary_average(&b.job)
                .total_cmp(&salary_average(&a.job))
                .then_with(|| newest_first(&a.job.created_at, &b.job.created_at))
        }),
        SortOrder::SalaryLowToHigh => listings.sort_by(|a, b| {
            salary_average(&a.job)
                .total_cmp(&salary_average(&b.job))
                .then_with(|| newest_first(&a.job.created_at, &b.job.created_at))
        }),
    }
}

/// Distinct values available for building filter controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Facets {
    pub job_types: Vec<String>,
    pub experience_levels: Vec<String>,
    pub skills: Vec<String>,
}

/// Title-case each hyphen-separated segment: "full-time" becomes "Full-Time".
pub fn title_case_hyphenated(s: &str) -> String {
    s.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join("-")
}

/// Collect facets from the given jobs.
pub fn facets<'a>(jobs: impl IntoIterator<Item = &'a Job>) -> Facets {
    let mut job_types = BTreeSet::new();
    let mut levels = BTreeSet::new();
    let mut skills = BTreeSet::new();

    for job in jobs {
        if !job.job_type.trim().is_empty() {
            job_types.insert(title_case_hyphenated(job.job_type.trim()));
        }
        levels.insert(job.experience);
        for skill in &job.skills {
            let skill = skill.trim();
            if !skill.is_empty() {
                skills.insert(skill.to_string());
            }
        }
    }

    Facets {
        job_types: job_types.into_iter().collect(),
        experience_levels: levels.into_iter().map(|l| l.short_form().to_string()).collect(),
        skills: skills.into_iter().collect(),
    }
}
