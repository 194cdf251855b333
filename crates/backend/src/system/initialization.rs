use anyhow::{Context, Result};
use contracts::domain::a001_category::aggregate::{Category, CategoryDto, CategoryId};
use contracts::domain::a002_course::aggregate::{CommentDto, Course};
use contracts::domain::a002_course::factory::CourseDescriptionFactory;
use contracts::system::users::CreateUserDto;

use crate::shared::app_state::AppState;
use crate::system::users::{repository as user_repository, service as user_service};

const DEMO_USER_EMAIL: &str = "email@email.com";
const ADMIN_EMAIL: &str = "admin@email.com";

/// Дерево категорий по умолчанию: (название, родитель)
const DEFAULT_CATEGORIES: [(&str, i32); 8] = [
    ("Programowanie", 0),
    ("Biznes", 0),
    ("Projektowanie", 0),
    ("Tworzenie stron internetowych", 1),
    ("Tworzenie gier", 1),
    ("Prowadzenie firmy", 2),
    ("Komunikacja i zarządzanie", 2),
    ("Narzędzia projektowe", 3),
];

/// Заполнение пустой базы демонстрационными данными
pub async fn seed_if_empty(state: &AppState) -> Result<()> {
    let demo_user_id = ensure_users_exist().await?;

    if state.categories.main_categories().await?.is_empty() {
        seed_categories(state).await?;
    }

    if state.courses.list_all().await?.is_empty() {
        match demo_user_id {
            Some(author_id) => seed_courses(state, &author_id).await?,
            None => tracing::info!("Users already exist, skipping sample courses"),
        }
    }

    Ok(())
}

/// Создать администратора и демо-пользователя; возвращает ID демо-пользователя
async fn ensure_users_exist() -> Result<Option<String>> {
    if user_repository::count_users().await? > 0 {
        return Ok(None);
    }

    tracing::info!("No users found. Creating default users...");
    let demo_id = user_service::create(sample_user(DEMO_USER_EMAIL, "user", false)).await?;
    tracing::info!("CREATED USER {}", DEMO_USER_EMAIL);

    user_service::create(sample_user(ADMIN_EMAIL, "admin", true)).await?;
    tracing::warn!("═══════════════════════════════════════════════");
    tracing::warn!("  Default admin user created!");
    tracing::warn!("  Email: {}", ADMIN_EMAIL);
    tracing::warn!("  Password: admin");
    tracing::warn!("  ⚠️  PLEASE CHANGE THE PASSWORD IMMEDIATELY!");
    tracing::warn!("═══════════════════════════════════════════════");

    Ok(Some(demo_id))
}

fn sample_user(email: &str, password: &str, is_admin: bool) -> CreateUserDto {
    CreateUserDto {
        email: email.to_string(),
        password: password.to_string(),
        first_name: "Name".to_string(),
        last_name: "Last".to_string(),
        is_admin,
    }
}

async fn seed_categories(state: &AppState) -> Result<()> {
    for (name, parent) in DEFAULT_CATEGORIES {
        let category = state
            .categories
            .create(CategoryDto {
                name: name.to_string(),
                parent_category_id: parent,
            })
            .await
            .with_context(|| format!("Failed to seed category '{}'", name))?;
        tracing::info!("CREATED CATEGORY {}", category.name);
    }
    Ok(())
}

fn sample_course() -> Result<Course> {
    let factory: CourseDescriptionFactory = CourseDescriptionFactory::new();
    let description = factory.create_course_description(
        48.5,
        "Naucz się HTML 5, CSS 3, JS, XML, jQuery, AJAX, Responsive web design od podstaw. \
         Wyjaśnię Ci wszystko od A do Z!",
        "Naucz się wszystkiego od zera. Obal mit, że tworzenie stron internetowych jest trudne. \
         Twórz własne strony WWW od A do Z. Będziesz znać i rozumieć HTML 5, CSS 3, JS, XML, \
         jQuery oraz AJAX.",
        vec![
            "tworzyć od zera stronę WWW w HTML z rozwijanym menu w CSS".to_string(),
            "czym są, jakie są oraz jak korzystać z tagów HTML/selektorów CSS".to_string(),
            "nowości związane z HTML 5: tagi semantyczne, eventy, atrybuty".to_string(),
            "różnice między HTML, XHTML, HTML 5, CSS i CSS 3".to_string(),
        ],
        vec!["Wszystko wyjaśnione jest w kursie. Nie musisz posiadać żadnych wiadomości.".to_string()],
    )?;

    Ok(Course {
        title: "Kurs Tworzenia Stron WWW w HTML i CSS".to_string(),
        price: 59.99,
        course_description: Some(description),
        categories: vec![Category {
            id: CategoryId(1),
            ..Default::default()
        }],
        ..Default::default()
    })
}

async fn seed_courses(state: &AppState, author_id: &str) -> Result<()> {
    let rated = state.courses.create(sample_course()?, author_id).await?;
    state
        .courses
        .add_comment(
            rated.id,
            author_id,
            CommentDto {
                description: "Some comment".to_string(),
                rate: Some(5.0),
            },
        )
        .await?;
    tracing::info!("CREATED COURSE {} ({})", rated.title, rated.id);

    let plain = state.courses.create(sample_course()?, author_id).await?;
    tracing::info!("CREATED COURSE {} ({})", plain.title, plain.id);

    Ok(())
}
