pub mod course;
pub mod dashboard;
pub mod hometask;

pub use course::{Course, CourseUpdate, NewCourse};
pub use dashboard::{Dashboard, DashboardStats, HometaskWithCourse};
pub use hometask::{Hometask, HometaskFilter, HometaskUpdate, NewHometask, TaskStatus};
