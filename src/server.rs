use actix_session::storage::CookieSessionStore;
use actix_session::{Session, SessionMiddleware};
use actix_web::cookie::Key;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{middleware, web, App, HttpResponse, HttpServer};
use anyhow::Context;
use chrono::Local;
use serde::Serialize;

use crate::config::{AppConfig, ServeArgs};
use crate::error::AppError;
use crate::form::{StudentForm, ValidationError};
use crate::models::{ScoreOutcome, StudentRecord};
use crate::output;
use crate::report;
use crate::session::{current_user, RecordSlot};

#[derive(Debug, Serialize)]
struct PredictResponse<'a> {
    #[serde(flatten)]
    outcome: ScoreOutcome,
    message: &'static str,
    student: &'a StudentRecord,
}

pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    let key = args.cookie_key()?;
    let config = web::Data::new(AppConfig::from(&args));
    let cookie_secure = args.cookie_secure;

    tracing::info!(
        bind = %args.bind,
        require_login = config.require_login,
        "starting student appraisal server"
    );

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(config.clone())
            .wrap(session_middleware(key.clone(), cookie_secure))
            .wrap(middleware::Logger::default())
            .configure(routes)
    });
    if let Some(workers) = args.workers {
        server = server.workers(workers);
    }

    server
        .bind(&args.bind)
        .with_context(|| format!("failed to bind {}", args.bind))?
        .run()
        .await
        .context("server terminated unexpectedly")
}

pub fn session_middleware(key: Key, cookie_secure: bool) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_secure(cookie_secure)
        .build()
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/predict", web::post().to(predict))
        .route("/report/{student_id}", web::get().to(student_report));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("student appraisal service is running")
}

async fn predict(
    session: Session,
    config: web::Data<AppConfig>,
    form: Result<web::Form<StudentForm>, actix_web::Error>,
) -> Result<HttpResponse, AppError> {
    // The body is only looked at once the caller has passed the gate.
    let user = require_login(&session, &config)?;
    let form = form.map_err(|err| ValidationError::Malformed {
        reason: err.to_string(),
    })?;
    let input = form.into_inner().validate()?;
    let record = StudentRecord::score(input);

    RecordSlot::new(&session).store(&record)?;
    tracing::info!(
        user = user.as_deref().unwrap_or("anonymous"),
        student_id = %record.student_id,
        prediction = record.prediction,
        probability = record.probability,
        "scored student"
    );

    Ok(HttpResponse::Ok().json(PredictResponse {
        outcome: record.outcome(),
        message: record.message(),
        student: &record,
    }))
}

async fn student_report(
    session: Session,
    config: web::Data<AppConfig>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    require_login(&session, &config)?;
    let student_id = path.into_inner();

    let record = RecordSlot::new(&session)
        .load_for(&student_id)?
        .ok_or_else(|| AppError::RecordNotFound {
            student_id: student_id.clone(),
        })?;

    let generated_at = Local::now().naive_local();
    let pdf = report::build_report(&record, generated_at)?;
    let filename = report::report_filename(&record.student_id, generated_at);

    if let Some(dir) = &config.report_dir {
        // The archive copy is best effort; the download does not depend on it.
        match output::write_atomically(dir, &filename, &pdf) {
            Ok(path) => tracing::debug!(path = %path.display(), "archived report"),
            Err(err) => tracing::warn!(error = %err, "failed to archive report"),
        }
    }

    tracing::info!(student_id = %record.student_id, bytes = pdf.len(), "generated report");

    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(filename)],
        })
        .body(pdf))
}

/// Identity gate. Login itself is handled elsewhere; it leaves `username`
/// in the session.
fn require_login(session: &Session, config: &AppConfig) -> Result<Option<String>, AppError> {
    let user = current_user(session)?;
    if user.is_none() && config.require_login {
        return Err(AppError::Unauthenticated {
            login_url: config.login_url.clone(),
        });
    }
    Ok(user)
}
