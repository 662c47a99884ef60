//! Homepage statistics, served from a time-expiring snapshot.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use jobquest_firestore::{DataStore, JobStore, UserStore};
use jobquest_models::{Company, CompanyStatus, Job, Role, User, UserId};

use crate::cache::TtlCache;
use crate::error::ApiResult;
use crate::metrics;
use crate::services::jobs::JobSummary;

const FEATURED_COMPANIES: usize = 5;
const RECENT_JOBS: usize = 3;

/// Icon shown for an industry category.
pub fn category_icon(industry: &str) -> &'static str {
    match industry {
        "Technology" => "💻",
        "Finance" => "💰",
        "Healthcare" => "🏥",
        "Education" => "📚",
        "Marketing" => "📣",
        _ => "📦",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateStats {
    pub total_candidates: usize,
    /// Number of job seekers listing each skill.
    pub skills: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyTotals {
    pub total_companies: usize,
    pub industries: Vec<String>,
    pub locations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    /// Jobs open for applications.
    pub total_jobs: usize,
    pub candidates: CandidateStats,
    pub companies: CompanyTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedCompany {
    pub id: UserId,
    pub name: String,
    pub logo: String,
    pub industry: Option<String>,
    pub description: String,
    pub active_jobs_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub name: String,
    pub icon: &'static str,
    pub count: usize,
}

/// Everything the homepage shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeStats {
    pub stats: Totals,
    pub featured_companies: Vec<FeaturedCompany>,
    pub recent_jobs: Vec<JobSummary>,
    pub categories: Vec<Category>,
}

/// Build the snapshot from the current store contents.
pub fn compute_home_stats(jobs: &[Job], seekers: &[User], recruiters: &[User], now: DateTime<Utc>) -> HomeStats {
    let mut available: Vec<&Job> = jobs.iter().filter(|j| j.is_available(now)).collect();
    available.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut skills = BTreeMap::new();
    for resume in seekers.iter().filter_map(User::resume) {
        let distinct: BTreeSet<&str> = resume
            .skills
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        for skill in distinct {
            *skills.entry(skill.to_string()).or_insert(0) += 1;
        }
    }

    let companies: Vec<(&User, &Company)> = recruiters
        .iter()
        .filter_map(|r| r.company().map(|c| (r, c)))
        .collect();
    let industries: BTreeSet<String> = companies
        .iter()
        .filter_map(|(_, c)| c.industry.clone())
        .filter(|s| !s.trim().is_empty())
        .collect();
    let locations: BTreeSet<String> = companies
        .iter()
        .filter_map(|(_, c)| c.location.clone())
        .filter(|s| !s.trim().is_empty())
        .collect();

    let mut open_by_recruiter: HashMap<&UserId, usize> = HashMap::new();
    for job in &available {
        *open_by_recruiter.entry(&job.recruiter_id).or_insert(0) += 1;
    }
    let mut featured: Vec<FeaturedCompany> = companies
        .iter()
        .filter(|(_, c)| c.status == CompanyStatus::Active)
        .filter_map(|(r, c)| {
            let count = open_by_recruiter.get(&r.id).copied().unwrap_or(0);
            (count > 0).then(|| FeaturedCompany {
                id: r.id.clone(),
                name: c.name.clone(),
                logo: c.logo.clone(),
                industry: c.industry.clone(),
                description: c.description.clone(),
                active_jobs_count: count,
            })
        })
        .collect();
    featured.sort_by(|a, b| {
        b.active_jobs_count
            .cmp(&a.active_jobs_count)
            .then_with(|| a.name.cmp(&b.name))
    });
    featured.truncate(FEATURED_COMPANIES);

    let recruiters_by_id: HashMap<&UserId, &User> = recruiters.iter().map(|r| (&r.id, r)).collect();
    let recent_jobs = available
        .iter()
        .take(RECENT_JOBS)
        .map(|job| JobSummary::of(job, recruiters_by_id.get(&job.recruiter_id).copied(), now))
        .collect();

    let mut by_industry: BTreeMap<&str, usize> = BTreeMap::new();
    for job in &available {
        *by_industry.entry(job.industry.as_str()).or_insert(0) += 1;
    }
    let mut categories: Vec<Category> = by_industry
        .into_iter()
        .map(|(name, count)| Category {
            name: name.to_string(),
            icon: category_icon(name),
            count,
        })
        .collect();
    categories.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

    HomeStats {
        stats: Totals {
            total_jobs: available.len(),
            candidates: CandidateStats {
                total_candidates: seekers.len(),
                skills,
            },
            companies: CompanyTotals {
                total_companies: companies.len(),
                industries: industries.into_iter().collect(),
                locations: locations.into_iter().collect(),
            },
        },
        featured_companies: featured,
        recent_jobs,
        categories,
    }
}

/// Homepage statistics with a shared TTL snapshot.
#[derive(Clone)]
pub struct StatsService {
    store: Arc<dyn DataStore>,
    cache: Arc<TtlCache<HomeStats>>,
}

impl StatsService {
    pub fn new(store: Arc<dyn DataStore>, cache: Arc<TtlCache<HomeStats>>) -> Self {
        Self { store, cache }
    }

    async fn compute(&self) -> ApiResult<HomeStats> {
        let jobs = self.store.list_jobs(None).await?;
        let seekers = self.store.list_users(Some(Role::JobSeeker)).await?;
        let recruiters = self.store.list_users(Some(Role::Recruiter)).await?;
        Ok(compute_home_stats(&jobs, &seekers, &recruiters, Utc::now()))
    }

    pub async fn home(&self) -> ApiResult<HomeStats> {
        let (stats, lookup) = self.cache.get_or_compute(|| self.compute()).await?;
        metrics::record_stats_lookup(lookup);
        debug!(?lookup, "Served homepage stats");
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jobquest_firestore::MemoryStore;
    use jobquest_models::{JobId, JobStatus, Profile, Resume};

    fn job(owner: &User, industry: &str, minutes_ago: i64, status: JobStatus) -> Job {
        let created = Utc::now() - Duration::minutes(minutes_ago);
        Job {
            id: JobId::new(),
            recruiter_id: owner.id.clone(),
            title: format!("{} role", industry),
            industry: industry.to_string(),
            job_type: "full-time".into(),
            experience: Default::default(),
            salary: "Not specified".into(),
            location: "Remote".into(),
            description: "Work".into(),
            status,
            application_deadline: Job::default_deadline(created),
            skills: vec![],
            requirements: vec!["x".into()],
            responsibilities: vec!["y".into()],
            created_at: created,
            updated_at: created,
        }
    }

    fn recruiter(email: &str, company: &str, industry: &str) -> User {
        let mut c = Company::new(company, "About us");
        c.industry = Some(industry.to_string());
        c.location = Some("London".to_string());
        User::new(email, "h", "Rec", "5550100", Profile::Recruiter { company: Some(c) })
    }

    fn seeker(email: &str, skills: &[&str]) -> User {
        let resume = Resume {
            skills: skills.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        User::new(email, "h", "Seeker", "5550100", Profile::JobSeeker { resume: Some(resume) })
    }

    #[test]
    fn test_compute_counts_only_available_jobs() {
        let acme = recruiter("a@acme.example", "Acme", "Technology");
        let bank = recruiter("b@bank.example", "Bank", "Finance");
        let jobs = vec![
            job(&acme, "Technology", 1, JobStatus::Active),
            job(&acme, "Technology", 2, JobStatus::Active),
            job(&bank, "Finance", 3, JobStatus::Active),
            job(&bank, "Finance", 4, JobStatus::Inactive),
            job(&bank, "Agriculture", 5, JobStatus::Active),
        ];
        let seekers = vec![seeker("s1@x.example", &["Rust", "SQL"]), seeker("s2@x.example", &["Rust", "rust "])];

        let stats = compute_home_stats(&jobs, &seekers, &[acme.clone(), bank], Utc::now());

        assert_eq!(stats.stats.total_jobs, 4);
        assert_eq!(stats.stats.candidates.total_candidates, 2);
        assert_eq!(stats.stats.candidates.skills.get("Rust"), Some(&2));
        assert_eq!(stats.stats.companies.total_companies, 2);
        assert_eq!(stats.stats.companies.industries, vec!["Finance", "Technology"]);
        assert_eq!(stats.stats.companies.locations, vec!["London"]);

        assert_eq!(stats.featured_companies[0].name, "Acme");
        assert_eq!(stats.featured_companies[0].active_jobs_count, 2);
        assert_eq!(stats.featured_companies[1].active_jobs_count, 2);

        assert_eq!(stats.recent_jobs.len(), 3);
        assert_eq!(stats.recent_jobs[0].company, "Acme");

        let tech = stats.categories.iter().find(|c| c.name == "Technology").unwrap();
        assert_eq!((tech.icon, tech.count), ("💻", 2));
        let other = stats.categories.iter().find(|c| c.name == "Agriculture").unwrap();
        assert_eq!(other.icon, "📦");
    }

    #[tokio::test(start_paused = true)]
    async fn test_home_serves_snapshot_until_ttl_expires() {
        let store = Arc::new(MemoryStore::new());
        let acme = recruiter("a@acme.example", "Acme", "Technology");
        store.create_user(&acme).await.unwrap();
        store
            .create_job(&job(&acme, "Technology", 1, JobStatus::Active))
            .await
            .unwrap();

        let service = StatsService::new(
            store.clone(),
            Arc::new(TtlCache::new(std::time::Duration::from_secs(300))),
        );
        assert_eq!(service.home().await.unwrap().stats.total_jobs, 1);

        store
            .create_job(&job(&acme, "Technology", 0, JobStatus::Active))
            .await
            .unwrap();
        assert_eq!(service.home().await.unwrap().stats.total_jobs, 1);

        tokio::time::advance(std::time::Duration::from_secs(299)).await;
        assert_eq!(service.home().await.unwrap().stats.total_jobs, 1);

        tokio::time::advance(std::time::Duration::from_secs(2)).await;
        assert_eq!(service.home().await.unwrap().stats.total_jobs, 2);
    }
}
