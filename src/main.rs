use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use color_eyre::Result;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

mod adapters;
mod application;
mod domain;
mod ports;

use adapters::{config::FileConfigStore, observer::TracingObserver, storage::JsonFileStorage};
use application::{AppError, AppResult, ProjectStore, Session};
use domain::*;
use ports::ConfigStore;

fn cli() -> Command {
    let project_id = || {
        Arg::new("project_id")
            .help("Project ID")
            .required(true)
            .index(1)
    };
    let task_id = || Arg::new("task_id").help("Task ID").required(true).index(2);
    let text = |name: &'static str, help: &'static str| {
        Arg::new(name).long(name).value_name("TEXT").help(help)
    };

    Command::new("projecthub")
        .version("0.1.0")
        .about("Student group projects: kanban boards, submissions and reviews")
        .long_about("Teachers create projects and review submissions; students organize tasks on a kanban board and submit their work.\n\nLog in first with `projecthub login`. Everything is kept in a single JSON file.")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("data-file")
                .long("data-file")
                .value_name("PATH")
                .env("PROJECTHUB_DATA")
                .value_parser(value_parser!(PathBuf))
                .help("Project data file (defaults to the configured location)")
                .global(true),
        )
        .subcommand(
            Command::new("login")
                .about("Start a session as a teacher or student")
                .arg(text("name", "Full name").required(true))
                .arg(text("email", "Email address").required(true))
                .arg(
                    Arg::new("role")
                        .long("role")
                        .value_name("ROLE")
                        .default_value("student")
                        .help("teacher or student"),
                )
                .arg(
                    Arg::new("id")
                        .long("id")
                        .value_name("USER_ID")
                        .help("Reuse an existing user ID"),
                ),
        )
        .subcommand(Command::new("logout").about("End the current session"))
        .subcommand(Command::new("whoami").about("Show the current user"))
        .subcommand(Command::new("dashboard").about("Your projects with summary statistics"))
        .subcommand(
            Command::new("projects")
                .about("Project operations")
                .subcommand_required(true)
                .subcommand(
                    Command::new("list").about("List your projects as JSON").arg(
                        Arg::new("all")
                            .long("all")
                            .action(ArgAction::SetTrue)
                            .help("List every stored project, not just yours"),
                    ),
                )
                .subcommand(
                    Command::new("get")
                        .about("Get a specific project by ID")
                        .arg(project_id()),
                )
                .subcommand(
                    Command::new("create")
                        .about("Create a project")
                        .arg(text("title", "Project title").required(true))
                        .arg(text("description", "Project description"))
                        .arg(
                            Arg::new("due")
                                .long("due")
                                .value_name("DATE")
                                .required(true)
                                .help("Due date (YYYY-MM-DD or RFC 3339)"),
                        )
                        .arg(
                            Arg::new("students")
                                .long("students")
                                .value_name("USER_IDS")
                                .value_delimiter(',')
                                .help("Comma-separated student IDs"),
                        ),
                )
                .subcommand(
                    Command::new("update")
                        .about("Change project fields")
                        .arg(project_id())
                        .arg(text("title", "New title"))
                        .arg(text("description", "New description"))
                        .arg(Arg::new("due").long("due").value_name("DATE").help("New due date"))
                        .arg(
                            Arg::new("status")
                                .long("status")
                                .value_name("STATUS")
                                .help("active, submitted or completed"),
                        )
                        .arg(
                            Arg::new("students")
                                .long("students")
                                .value_name("USER_IDS")
                                .value_delimiter(',')
                                .help("Replace the assigned students"),
                        )
                        .arg(
                            Arg::new("progress")
                                .long("progress")
                                .value_name("PERCENT")
                                .value_parser(value_parser!(u8).range(0..=100))
                                .help("Override the cached progress"),
                        ),
                )
                .subcommand(
                    Command::new("delete")
                        .about("Delete a project with all its tasks and submissions")
                        .arg(project_id()),
                )
                .subcommand(
                    Command::new("submit")
                        .about("Submit project work for review")
                        .arg(project_id())
                        .arg(text("title", "Submission title").required(true))
                        .arg(text("description", "What was done").required(true))
                        .arg(
                            Arg::new("file-url")
                                .long("file-url")
                                .value_name("URL")
                                .help("Link to the hosted deliverable"),
                        ),
                )
                .subcommand(
                    Command::new("review")
                        .about("Approve or reject a submission")
                        .arg(project_id())
                        .arg(
                            Arg::new("submission_id")
                                .help("Submission ID")
                                .required(true)
                                .index(2),
                        )
                        .arg(
                            Arg::new("status")
                                .long("status")
                                .value_name("STATUS")
                                .required(true)
                                .help("approved or rejected"),
                        ),
                )
                .subcommand(
                    Command::new("sync-progress")
                        .about("Store the current task completion percentage")
                        .arg(project_id()),
                )
                .subcommand(
                    Command::new("analytics")
                        .about("Task breakdowns and completion rate")
                        .arg(project_id()),
                )
                .subcommand(
                    Command::new("board")
                        .about("Tasks grouped into kanban columns")
                        .arg(project_id()),
                ),
        )
        .subcommand(
            Command::new("tasks")
                .about("Task operations")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .about("Add a task to the To Do column")
                        .arg(project_id())
                        .arg(text("title", "Task title").required(true))
                        .arg(text("description", "Task description"))
                        .arg(
                            Arg::new("priority")
                                .long("priority")
                                .value_name("PRIORITY")
                                .default_value("medium")
                                .help("low, medium or high"),
                        )
                        .arg(
                            Arg::new("assignee")
                                .long("assignee")
                                .value_name("USER_ID")
                                .help("Assign to a user (defaults to you)"),
                        ),
                )
                .subcommand(
                    Command::new("get")
                        .about("Show a task with its comments")
                        .arg(project_id())
                        .arg(task_id()),
                )
                .subcommand(
                    Command::new("move")
                        .about("Move a task to another kanban column")
                        .arg(project_id())
                        .arg(task_id())
                        .arg(
                            Arg::new("status")
                                .help("todo, in-progress or done")
                                .required(true)
                                .index(3),
                        ),
                )
                .subcommand(
                    Command::new("update")
                        .about("Edit a task")
                        .arg(project_id())
                        .arg(task_id())
                        .arg(text("title", "New title"))
                        .arg(text("description", "New description"))
                        .arg(
                            Arg::new("status")
                                .long("status")
                                .value_name("STATUS")
                                .help("todo, in-progress or done"),
                        )
                        .arg(
                            Arg::new("priority")
                                .long("priority")
                                .value_name("PRIORITY")
                                .help("low, medium or high"),
                        )
                        .arg(
                            Arg::new("assignee")
                                .long("assignee")
                                .value_name("USER_ID")
                                .conflicts_with("unassign")
                                .help("Reassign the task"),
                        )
                        .arg(
                            Arg::new("unassign")
                                .long("unassign")
                                .action(ArgAction::SetTrue)
                                .help("Clear the assignee"),
                        ),
                )
                .subcommand(
                    Command::new("delete")
                        .about("Delete a task")
                        .arg(project_id())
                        .arg(task_id()),
                )
                .subcommand(
                    Command::new("comment")
                        .about("Comment on a task")
                        .arg(project_id())
                        .arg(task_id())
                        .arg(text("text", "Comment text").required(true)),
                ),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize color-eyre for better error reporting
    color_eyre::install()?;

    let config_store = Arc::new(FileConfigStore::new()?);

    // Log to a file so stdout stays clean for JSON output
    std::fs::create_dir_all(config_store.config_dir())?;
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(config_store.log_path())?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let matches = cli().get_matches();

    if let Err(e) = run(&matches, config_store).await {
        tracing::warn!("Command failed: {}", e);
        eprintln!("❌ {e}");
        if matches!(e, AppError::NotLoggedIn) {
            eprintln!();
            eprintln!("💡 Tip: run `projecthub login --name <NAME> --email <EMAIL> --role teacher|student`");
        } else if e.is_not_found() {
            eprintln!();
            eprintln!("💡 Tip: `projecthub projects list` shows the IDs you can use");
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(matches: &ArgMatches, config_store: Arc<FileConfigStore>) -> AppResult<()> {
    let config = config_store.load_config().await?;
    let session = Session::new(config_store.clone());
    session.initialize().await?;

    match matches.subcommand() {
        Some(("login", login_matches)) => {
            let role: Role = required(login_matches, "role")?.parse()?;
            let user = session
                .login(
                    required(login_matches, "name")?,
                    required(login_matches, "email")?,
                    role,
                    optional(login_matches, "id").map(UserId::from),
                )
                .await?;
            print_json(&user)
        }
        Some(("logout", _)) => {
            let previous = session.logout().await?;
            print_json(&json!({ "loggedOut": previous }))
        }
        Some(("whoami", _)) => print_json(&session.require_user().await?),
        Some((command, sub_matches)) => {
            let data_file = matches
                .get_one::<PathBuf>("data-file")
                .cloned()
                .or(config.data_file)
                .unwrap_or_else(|| config_store.default_data_file());
            tracing::debug!("Using data file {}", data_file.display());

            let mut store = ProjectStore::open(Box::new(JsonFileStorage::new(data_file)))?;
            store.subscribe(Box::new(TracingObserver));
            store.set_current_user(session.current_user().await);

            match command {
                "dashboard" => dashboard(&store, &session.require_user().await?),
                "projects" => projects(&mut store, sub_matches),
                "tasks" => tasks(&mut store, sub_matches),
                other => Err(AppError::Application(format!("Unknown command: {other}"))),
            }
        }
        None => Err(AppError::Application("No command given".to_string())),
    }
}

fn dashboard(store: &ProjectStore, user: &User) -> AppResult<()> {
    let now = chrono::Utc::now();
    let projects = store.get_projects_by_user();
    let stats = DashboardStats::collect(projects.iter().copied(), now);

    let cards: Vec<_> = projects
        .iter()
        .map(|project| {
            json!({
                "id": project.id,
                "title": project.title,
                "status": project.status,
                "dueDate": project.due_date,
                "overdue": project.is_overdue_at(now),
                "daysRemaining": project.days_remaining_at(now),
                "progress": project.progress,
                "doneTasks": project.done_task_count(),
                "totalTasks": project.tasks.len(),
                "submissions": project.submissions.len(),
            })
        })
        .collect();

    // Teachers track incoming work, students track deadlines
    let summary = if user.is_teacher() {
        let pending_review = projects
            .iter()
            .flat_map(|project| &project.submissions)
            .filter(|submission| submission.is_pending())
            .count();
        json!({
            "total": stats.total,
            "active": stats.active,
            "completed": stats.completed,
            "submissions": stats.submissions,
            "pendingReview": pending_review,
        })
    } else {
        json!({
            "total": stats.total,
            "active": stats.active,
            "completed": stats.completed,
            "overdue": stats.overdue,
        })
    };

    print_json(&json!({
        "user": user,
        "stats": summary,
        "projects": cards,
    }))
}

fn projects(store: &mut ProjectStore, matches: &ArgMatches) -> AppResult<()> {
    match matches.subcommand() {
        Some(("list", list_matches)) => {
            if list_matches.get_flag("all") {
                print_json(store.projects())
            } else {
                print_json(&store.get_projects_by_user())
            }
        }
        Some(("get", get_matches)) => {
            let project = find_project(store, &project_arg(get_matches)?)?;
            print_json(project)
        }
        Some(("create", create_matches)) => {
            let title = required(create_matches, "title")?;
            require_text("title", title)?;

            let project = store.create_project(ProjectDraft {
                title: title.to_string(),
                description: optional(create_matches, "description")
                    .unwrap_or_default()
                    .to_string(),
                due_date: parse_due_date(required(create_matches, "due")?)?,
                assigned_students: user_ids(create_matches, "students").unwrap_or_default(),
            })?;
            print_json(&project)
        }
        Some(("update", update_matches)) => {
            let project_id = project_arg(update_matches)?;
            let update = ProjectUpdate {
                title: optional(update_matches, "title").map(str::to_string),
                description: optional(update_matches, "description").map(str::to_string),
                due_date: optional(update_matches, "due").map(parse_due_date).transpose()?,
                status: optional(update_matches, "status").map(str::parse).transpose()?,
                assigned_students: user_ids(update_matches, "students"),
                progress: update_matches.get_one::<u8>("progress").copied(),
            };
            if update.is_empty() {
                return Err(AppError::Application("Nothing to update".to_string()));
            }

            store.update_project(&project_id, update)?;
            print_json(find_project(store, &project_id)?)
        }
        Some(("delete", delete_matches)) => {
            let project_id = project_arg(delete_matches)?;
            store.delete_project(&project_id)?;
            print_json(&json!({ "deleted": project_id }))
        }
        Some(("submit", submit_matches)) => {
            let project_id = project_arg(submit_matches)?;
            let title = required(submit_matches, "title")?;
            let description = required(submit_matches, "description")?;
            require_text("title", title)?;
            require_text("description", description)?;

            let submission = store.submit_project(
                &project_id,
                SubmissionDraft {
                    title: title.to_string(),
                    description: description.to_string(),
                    file_url: optional(submit_matches, "file-url")
                        .unwrap_or_default()
                        .to_string(),
                },
            )?;
            print_json(&submission)
        }
        Some(("review", review_matches)) => {
            let project_id = project_arg(review_matches)?;
            let submission_id = SubmissionId::from(required(review_matches, "submission_id")?);
            let status: SubmissionStatus = required(review_matches, "status")?.parse()?;

            store.review_submission(&project_id, &submission_id, status)?;
            print_json(&find_project(store, &project_id)?.submissions)
        }
        Some(("sync-progress", sync_matches)) => {
            let project_id = project_arg(sync_matches)?;
            let progress = store.sync_progress(&project_id)?;
            print_json(&json!({ "id": project_id, "progress": progress }))
        }
        Some(("analytics", analytics_matches)) => {
            let project = find_project(store, &project_arg(analytics_matches)?)?;
            print_json(&ProjectAnalytics::for_project(project))
        }
        Some(("board", board_matches)) => {
            let project = find_project(store, &project_arg(board_matches)?)?;
            let columns: Vec<_> = TaskStatus::COLUMNS
                .iter()
                .map(|status| {
                    json!({
                        "column": status.title(),
                        "status": status,
                        "tasks": project.tasks_by_status(*status),
                    })
                })
                .collect();
            print_json(&columns)
        }
        _ => Err(AppError::Application("Unknown projects subcommand".to_string())),
    }
}

fn tasks(store: &mut ProjectStore, matches: &ArgMatches) -> AppResult<()> {
    match matches.subcommand() {
        Some(("add", add_matches)) => {
            let project_id = project_arg(add_matches)?;
            let draft = task_draft(add_matches, store.current_user())?;
            let task = store.add_task(&project_id, draft)?;
            sync_progress_after_task_change(store, &project_id);
            print_json(&task)
        }
        Some(("get", get_matches)) => {
            let project = find_project(store, &project_arg(get_matches)?)?;
            let task_id = TaskId::from(required(get_matches, "task_id")?);
            let task = project.task(&task_id).ok_or_else(|| AppError::TaskNotFound {
                project_id: project.id.clone(),
                task_id: task_id.clone(),
            })?;

            let comments: Vec<_> = task
                .comments
                .iter()
                .map(|comment| {
                    json!({
                        "id": comment.id,
                        "text": comment.text,
                        "userName": comment.user_name,
                        "createdAt": comment.created_at,
                        "age": comment.time_since_created(),
                    })
                })
                .collect();

            print_json(&json!({
                "id": task.id,
                "title": task.title,
                "description": task.description,
                "status": task.status,
                "column": task.status.title(),
                "priority": task.priority,
                "assignedTo": task.assigned_to,
                "createdAt": task.created_at,
                "comments": comments,
            }))
        }
        Some(("move", move_matches)) => {
            let project_id = project_arg(move_matches)?;
            let task_id = TaskId::from(required(move_matches, "task_id")?);
            let status: TaskStatus = required(move_matches, "status")?.parse()?;

            store.update_task(&project_id, &task_id, TaskUpdate::status(status))?;
            let progress = sync_progress_after_task_change(store, &project_id);
            print_json(&json!({ "id": task_id, "status": status, "progress": progress }))
        }
        Some(("update", update_matches)) => {
            let project_id = project_arg(update_matches)?;
            let task_id = TaskId::from(required(update_matches, "task_id")?);

            let assigned_to = if update_matches.get_flag("unassign") {
                Some(None)
            } else {
                optional(update_matches, "assignee").map(|id| Some(UserId::from(id)))
            };
            let update = TaskUpdate {
                title: optional(update_matches, "title").map(str::to_string),
                description: optional(update_matches, "description").map(str::to_string),
                status: optional(update_matches, "status").map(str::parse).transpose()?,
                priority: optional(update_matches, "priority").map(str::parse).transpose()?,
                assigned_to,
            };
            if let Some(title) = &update.title {
                require_text("title", title)?;
            }

            store.update_task(&project_id, &task_id, update)?;
            sync_progress_after_task_change(store, &project_id);

            let project = find_project(store, &project_id)?;
            print_json(&project.task(&task_id))
        }
        Some(("delete", delete_matches)) => {
            let project_id = project_arg(delete_matches)?;
            let task_id = TaskId::from(required(delete_matches, "task_id")?);

            store.delete_task(&project_id, &task_id)?;
            sync_progress_after_task_change(store, &project_id);
            print_json(&json!({ "deleted": task_id }))
        }
        Some(("comment", comment_matches)) => {
            let project_id = project_arg(comment_matches)?;
            let task_id = TaskId::from(required(comment_matches, "task_id")?);
            let comment = store.add_comment(&project_id, &task_id, comment_draft(comment_matches)?)?;
            print_json(&comment)
        }
        _ => Err(AppError::Application("Unknown tasks subcommand".to_string())),
    }
}

/// Text is stored as entered; blank input is rejected.
fn task_draft(matches: &ArgMatches, current_user: Option<&User>) -> AppResult<TaskDraft> {
    let title = required(matches, "title")?;
    require_text("title", title)?;

    let assigned_to = optional(matches, "assignee")
        .map(UserId::from)
        .or_else(|| current_user.map(|user| user.id.clone()));

    Ok(TaskDraft {
        title: title.to_string(),
        description: optional(matches, "description")
            .unwrap_or_default()
            .to_string(),
        priority: required(matches, "priority")?.parse()?,
        assigned_to,
    })
}

fn comment_draft(matches: &ArgMatches) -> AppResult<CommentDraft> {
    let text = required(matches, "text")?;
    require_text("comment", text)?;
    Ok(CommentDraft {
        text: text.to_string(),
    })
}

/// Runs after the task change is already saved, so a failed progress write
/// is reported without failing the command. The cached progress stays stale
/// until the next successful sync.
fn sync_progress_after_task_change(store: &mut ProjectStore, project_id: &ProjectId) -> Option<u8> {
    match store.sync_progress(project_id) {
        Ok(progress) => Some(progress),
        Err(e) => {
            tracing::warn!("Progress sync for project {} failed: {}", project_id, e);
            eprintln!("⚠️  Task saved, but progress was not updated: {e}");
            None
        }
    }
}

fn find_project<'a>(store: &'a ProjectStore, project_id: &ProjectId) -> AppResult<&'a Project> {
    store
        .get_project_by_id(project_id)
        .ok_or_else(|| AppError::ProjectNotFound(project_id.clone()))
}

fn project_arg(matches: &ArgMatches) -> AppResult<ProjectId> {
    required(matches, "project_id").map(ProjectId::from)
}

fn optional<'a>(matches: &'a ArgMatches, name: &str) -> Option<&'a str> {
    matches.get_one::<String>(name).map(String::as_str)
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> AppResult<&'a str> {
    optional(matches, name).ok_or_else(|| AppError::Application(format!("Missing argument: {name}")))
}

fn user_ids(matches: &ArgMatches, name: &str) -> Option<Vec<UserId>> {
    matches.get_many::<String>(name).map(|values| {
        values
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(UserId::from)
            .collect()
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> AppResult<()> {
    let json =
        serde_json::to_string_pretty(value).map_err(|e| AppError::Serialization(e.to_string()))?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{MockSnapshotStorage, StorageError};

    #[test]
    fn test_cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn test_students_split_on_commas() {
        let matches = cli()
            .try_get_matches_from([
                "projecthub",
                "projects",
                "create",
                "--title",
                "Robotics",
                "--due",
                "2030-01-01",
                "--students",
                "s1, s2,,s3",
            ])
            .unwrap();
        let (_, projects) = matches.subcommand().unwrap();
        let (_, create) = projects.subcommand().unwrap();

        assert_eq!(
            user_ids(create, "students"),
            Some(vec!["s1".into(), "s2".into(), "s3".into()])
        );
    }

    fn subcommand_args(args: &[&str]) -> ArgMatches {
        let matches = cli()
            .try_get_matches_from(std::iter::once("projecthub").chain(args.iter().copied()))
            .unwrap();
        let (_, group) = matches.subcommand().unwrap();
        let (_, leaf) = group.subcommand().unwrap();
        leaf.clone()
    }

    #[test]
    fn test_task_and_comment_text_is_kept_as_entered() {
        let add = subcommand_args(&["tasks", "add", "p1", "--title", "  Wire motors  "]);
        let draft = task_draft(&add, None).unwrap();
        assert_eq!(draft.title, "  Wire motors  ");
        assert_eq!(draft.priority, TaskPriority::Medium);

        let comment = subcommand_args(&["tasks", "comment", "p1", "t1", "--text", " done \n"]);
        assert_eq!(comment_draft(&comment).unwrap().text, " done \n");

        let blank = subcommand_args(&["tasks", "comment", "p1", "t1", "--text", "   "]);
        assert!(matches!(comment_draft(&blank), Err(AppError::Domain(_))));
    }

    #[test]
    fn test_task_defaults_to_current_user() {
        let user = User {
            id: "s1".into(),
            name: "Sam".to_string(),
            email: "sam@school.edu".to_string(),
            role: Role::Student,
        };
        let add = subcommand_args(&["tasks", "add", "p1", "--title", "Solder"]);
        assert_eq!(task_draft(&add, Some(&user)).unwrap().assigned_to, Some("s1".into()));
    }

    #[test]
    fn test_failed_progress_sync_keeps_task_change() {
        let snapshot = r#"[{"id":"p1","title":"Rover","dueDate":"2030-01-01","createdAt":"2024-01-01T00:00:00Z",
            "tasks":[{"id":"t1","title":"Wheels","status":"done","createdAt":"2024-01-02T00:00:00Z"}],"progress":0}]"#;
        let mut storage = MockSnapshotStorage::new();
        storage
            .expect_read()
            .returning(move || Ok(Some(snapshot.to_string())));
        storage
            .expect_write()
            .returning(|_| Err(StorageError::Write("disk full".to_string())));

        let mut store = ProjectStore::open(Box::new(storage)).unwrap();
        let project_id = ProjectId::from("p1");

        assert_eq!(sync_progress_after_task_change(&mut store, &project_id), None);
        let project = store.get_project_by_id(&project_id).unwrap();
        assert_eq!(project.progress, 0);
        assert_eq!(project.computed_progress(), 100);
    }

    #[test]
    fn test_progress_is_range_checked() {
        let result = cli().try_get_matches_from([
            "projecthub",
            "projects",
            "update",
            "p1",
            "--progress",
            "120",
        ]);
        assert!(result.is_err());
    }
}
