use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::api::{api_hero, api_heroes};
use crate::config::Config;
use crate::error::{CheckError, Shape};
use crate::types::{Hero, UPDATED_NAME};

const OK: &[u16] = &[200];
// Servers answer a create with 201, or 200 when the id already exists.
const CREATED: &[u16] = &[200, 201];
const SEARCH_TERM_LEN: usize = 3;

/// State handed from one check to the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub hero: Hero,
    /// Prefix of the fixture's original name, fixed for the whole run.
    pub search_term: String,
}

impl Context {
    pub fn new(hero: Hero) -> Self {
        let search_term = hero.name.chars().take(SEARCH_TERM_LEN).collect();
        Self { hero, search_term }
    }

    pub fn renamed(self, name: &str) -> Self {
        Self {
            hero: Hero::new(self.hero.id, name),
            search_term: self.search_term,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(Hero::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Home,
    List,
    Create,
    Read,
    Search,
    Update,
    VerifyUpdate,
    Delete,
    VerifyDelete,
    More,
}

impl Check {
    pub const STANDARD: [Check; 8] = [
        Check::Home,
        Check::List,
        Check::Create,
        Check::Read,
        Check::Search,
        Check::Update,
        Check::Delete,
        Check::More,
    ];

    /// The standard run plus read-backs of the update and the delete.
    pub const EXTENDED: [Check; 10] = [
        Check::Home,
        Check::List,
        Check::Create,
        Check::Read,
        Check::Search,
        Check::Update,
        Check::VerifyUpdate,
        Check::Delete,
        Check::VerifyDelete,
        Check::More,
    ];

    pub fn sequence(extended: bool) -> &'static [Check] {
        if extended {
            &Self::EXTENDED
        } else {
            &Self::STANDARD
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Check::Home => "1. Test api host and port",
            Check::List => "2. List/Query",
            Check::Create => "3. New/(C)REATE",
            Check::Read => "4. Individual/(R)EAD",
            Check::Search => "5. Search Term",
            Check::Update => "6. Change/(U)PDATE",
            Check::VerifyUpdate => "6a. Verify update",
            Check::Delete => "7. Remove/(D)ELETE",
            Check::VerifyDelete => "7a. Verify delete",
            Check::More => "8. More test cases",
        }
    }
}

/// What happens to the remaining checks once one fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Policy {
    #[default]
    Continue,
    FailFast,
}

#[derive(Debug)]
pub enum Verdict {
    Passed,
    Failed(CheckError),
    Skipped,
}

impl Verdict {
    pub fn is_passed(&self) -> bool {
        matches!(self, Verdict::Passed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Verdict::Failed(_))
    }
}

#[derive(Debug)]
pub struct Outcome {
    pub check: Check,
    pub verdict: Verdict,
    /// Context after this check, input of the next one.
    pub context: Context,
    pub note: Option<String>,
}

#[derive(Debug, Default)]
pub struct Report {
    pub outcomes: Vec<Outcome>,
}

impl Report {
    pub fn passed(&self) -> usize {
        self.count(Verdict::is_passed)
    }

    pub fn failed(&self) -> usize {
        self.count(Verdict::is_failed)
    }

    pub fn skipped(&self) -> usize {
        self.count(|v| matches!(v, Verdict::Skipped))
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.skipped() == 0
    }

    pub fn outcome(&self, check: Check) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| o.check == check)
    }

    fn count(&self, pred: impl Fn(&Verdict) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.verdict)).count()
    }
}

pub struct Checker {
    client: Client,
    base: String,
}

impl Checker {
    pub fn new(config: &Config) -> Result<Self, CheckError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, config.base_url()))
    }

    pub fn with_client(client: Client, base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self { client, base }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Runs `checks` in order, threading the context through each of them.
    pub async fn run(&self, checks: &[Check], policy: Policy, context: Context) -> Report {
        let mut report = Report::default();
        let mut context = context;
        let mut halted = false;

        for &check in checks {
            let outcome = if halted {
                Outcome {
                    check,
                    verdict: Verdict::Skipped,
                    context: context.clone(),
                    note: None,
                }
            } else {
                self.run_check(check, context).await
            };
            halted |= policy == Policy::FailFast && outcome.verdict.is_failed();
            context = outcome.context.clone();
            report.outcomes.push(outcome);
        }

        report
    }

    pub async fn run_check(&self, check: Check, context: Context) -> Outcome {
        debug!(check = check.label(), "running");
        let context = match check {
            Check::Update => context.renamed(UPDATED_NAME),
            _ => context,
        };

        let hero = &context.hero;
        let result = match check {
            Check::Home => self.home().await.map(Some),
            Check::List => self.list().await.map(|_| None),
            Check::Create => self.create(hero).await.map(|_| None),
            Check::Read | Check::VerifyUpdate => self.read(hero).await.map(|_| None),
            Check::Search => self.search(&context.search_term).await.map(|_| None),
            Check::Update => self.update(hero).await.map(|_| None),
            Check::Delete => self.delete(hero.id).await.map(|_| None),
            Check::VerifyDelete => self.verify_delete(hero.id).await.map(|_| None),
            Check::More => Ok(None),
        };

        let (verdict, note) = match result {
            Ok(note) => (Verdict::Passed, note),
            Err(err) => {
                warn!(check = check.label(), error = %err, "check failed");
                (Verdict::Failed(err), None)
            }
        };
        Outcome {
            check,
            verdict,
            context,
            note,
        }
    }

    async fn home(&self) -> Result<String, CheckError> {
        let reply = send(self.client.get(&self.base)).await?;
        reply.expect_status(OK)?;
        Ok(reply.body)
    }

    async fn list(&self) -> Result<Vec<Value>, CheckError> {
        let reply = send(self.client.get(api_heroes(&self.base))).await?;
        reply.expect_status(OK)?;
        reply.expect_json()?;
        reply.array()
    }

    async fn create(&self, hero: &Hero) -> Result<(), CheckError> {
        let reply = send(self.client.post(api_heroes(&self.base)).json(hero)).await?;
        reply.expect_status(CREATED)?;
        reply.expect_json()?;
        expect_hero(&reply.object()?, hero)
    }

    async fn read(&self, hero: &Hero) -> Result<(), CheckError> {
        let reply = send(self.client.get(api_hero(&self.base, hero.id))).await?;
        reply.expect_status(OK)?;
        reply.expect_json()?;
        expect_hero(&reply.object()?, hero)
    }

    async fn search(&self, term: &str) -> Result<Vec<Value>, CheckError> {
        let request = self.client.get(api_heroes(&self.base)).query(&[("name", term)]);
        let reply = send(request).await?;
        reply.expect_status(OK)?;
        reply.expect_json()?;
        reply.array()
    }

    async fn update(&self, hero: &Hero) -> Result<Map<String, Value>, CheckError> {
        let reply = send(self.client.put(api_heroes(&self.base)).json(hero)).await?;
        reply.expect_status(OK)?;
        reply.expect_json()?;
        reply.object()
    }

    async fn delete(&self, id: i64) -> Result<Map<String, Value>, CheckError> {
        let reply = send(self.client.delete(api_hero(&self.base, id))).await?;
        reply.expect_status(OK)?;
        reply.expect_json()?;
        reply.object()
    }

    async fn verify_delete(&self, id: i64) -> Result<(), CheckError> {
        let reply = send(self.client.get(api_hero(&self.base, id))).await?;
        if reply.status != StatusCode::OK {
            return Ok(());
        }
        match reply.object() {
            Ok(body) if expect_field(&body, "id", Value::from(id)).is_ok() => {
                Err(CheckError::StillPresent { id })
            }
            _ => Ok(()),
        }
    }
}

struct Reply {
    status: StatusCode,
    content_type: Option<String>,
    body: String,
}

async fn send(request: RequestBuilder) -> Result<Reply, CheckError> {
    let response = request.send().await?;
    let status = response.status();
    debug!(url = %response.url(), status = status.as_u16(), "response");
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.text().await?;
    Ok(Reply {
        status,
        content_type,
        body,
    })
}

impl Reply {
    fn expect_status(&self, expected: &'static [u16]) -> Result<(), CheckError> {
        let actual = self.status.as_u16();
        if expected.contains(&actual) {
            Ok(())
        } else {
            Err(CheckError::Status { expected, actual })
        }
    }

    fn expect_json(&self) -> Result<(), CheckError> {
        match &self.content_type {
            Some(ct) if ct.to_ascii_lowercase().contains("json") => Ok(()),
            other => Err(CheckError::ContentType {
                actual: other.clone(),
            }),
        }
    }

    fn json(&self) -> Result<Value, CheckError> {
        Ok(serde_json::from_str(&self.body)?)
    }

    fn array(&self) -> Result<Vec<Value>, CheckError> {
        match self.json()? {
            Value::Array(items) => Ok(items),
            other => Err(CheckError::Shape {
                expected: Shape::Array,
                actual: Shape::of(&other),
            }),
        }
    }

    fn object(&self) -> Result<Map<String, Value>, CheckError> {
        match self.json()? {
            Value::Object(fields) => Ok(fields),
            other => Err(CheckError::Shape {
                expected: Shape::Object,
                actual: Shape::of(&other),
            }),
        }
    }
}

fn expect_hero(body: &Map<String, Value>, hero: &Hero) -> Result<(), CheckError> {
    expect_field(body, "id", Value::from(hero.id))?;
    expect_field(body, "name", Value::from(hero.name.as_str()))
}

fn expect_field(
    body: &Map<String, Value>,
    field: &'static str,
    expected: Value,
) -> Result<(), CheckError> {
    let actual = body.get(field).cloned().unwrap_or(Value::Null);
    if same_value(&expected, &actual) {
        Ok(())
    } else {
        Err(CheckError::Field {
            field,
            expected,
            actual,
        })
    }
}

// Integers compare exactly; 1000 and 1000.0 are still the same JSON number.
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_f64() || y.is_f64() => {
            x.as_f64() == y.as_f64()
        }
        _ => a == b,
    }
}
