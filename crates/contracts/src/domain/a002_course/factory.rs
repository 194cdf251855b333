use std::collections::BTreeSet;
use std::marker::PhantomData;

use super::aggregate::{Course, CourseDescription, CourseFeedback};
use super::builder::{
    CourseBuilder, CourseDescriptionBuilder, StandardCourseBuilder,
    StandardCourseDescriptionBuilder,
};
use crate::domain::a001_category::aggregate::Category;
use crate::domain::common::ValidationError;
use crate::enums::language::Language;

/// Фабрика курсов с готовыми наборами обязательных полей.
///
/// Строитель создаётся заново на каждый вызов, общего состояния нет, поэтому
/// одну фабрику можно безопасно использовать из нескольких потоков.
/// Реализацию строителя задаёт параметр типа:
/// `CourseFactory::<MyCourseBuilder>::new()`.
pub struct CourseFactory<B = StandardCourseBuilder> {
    _builder: PhantomData<fn() -> B>,
}

impl<B> Default for CourseFactory<B> {
    fn default() -> Self {
        Self {
            _builder: PhantomData,
        }
    }
}

impl<B> Clone for CourseFactory<B> {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl<B> std::fmt::Debug for CourseFactory<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourseFactory")
            .field("builder", &std::any::type_name::<B>())
            .finish()
    }
}

impl<B: CourseBuilder + Default> CourseFactory<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Курс из названия, цены и описания
    pub fn create_course(
        &self,
        title: impl Into<String>,
        price: f64,
        description: CourseDescription,
    ) -> Result<Course, ValidationError> {
        let mut builder = B::default();
        builder
            .build_title(title)?
            .build_price(price)?
            .build_course_description(description)?;
        Ok(builder.take_result())
    }

    /// Курс из названия, цены, описания и категорий
    pub fn create_course_with_categories(
        &self,
        title: impl Into<String>,
        price: f64,
        description: CourseDescription,
        categories: Vec<Category>,
    ) -> Result<Course, ValidationError> {
        let mut builder = B::default();
        builder
            .build_title(title)?
            .build_price(price)?
            .build_course_description(description)?
            .build_categories(categories)?;
        Ok(builder.take_result())
    }

    /// Полный агрегат: языки, субтитры, категории и отзывы
    #[allow(clippy::too_many_arguments)]
    pub fn create_full_course(
        &self,
        title: impl Into<String>,
        price: f64,
        description: CourseDescription,
        languages: BTreeSet<Language>,
        subtitles: BTreeSet<Language>,
        categories: Vec<Category>,
        feedback: CourseFeedback,
    ) -> Result<Course, ValidationError> {
        let mut builder = B::default();
        builder
            .build_title(title)?
            .build_price(price)?
            .build_course_description(description)?
            .build_languages(languages)?
            .build_subtitles(subtitles)?
            .build_categories(categories)?
            .build_course_feedback(feedback)?;
        Ok(builder.take_result())
    }
}

/// Фабрика описаний курса; строитель также создаётся на каждый вызов
pub struct CourseDescriptionFactory<B = StandardCourseDescriptionBuilder> {
    _builder: PhantomData<fn() -> B>,
}

impl<B> Default for CourseDescriptionFactory<B> {
    fn default() -> Self {
        Self {
            _builder: PhantomData,
        }
    }
}

impl<B: CourseDescriptionBuilder + Default> CourseDescriptionFactory<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_course_description(
        &self,
        duration: f64,
        short_description: impl Into<String>,
        long_description: impl Into<String>,
        main_topics: Vec<String>,
        requirements: Vec<String>,
    ) -> Result<CourseDescription, ValidationError> {
        let mut builder = B::default();
        builder
            .build_duration(duration)?
            .build_short_description(short_description)?
            .build_long_description(long_description)?
            .build_main_topics(main_topics)?
            .build_requirements(requirements)?;
        Ok(builder.take_result())
    }
}
