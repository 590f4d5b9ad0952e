//! One query type per remote function.
//!
//! Each query is executed with `FunctionService::process`.

pub mod documents;
pub mod quizzes;
pub mod speech;
pub mod users;

pub use documents::SubmitCreationJob;
pub use quizzes::{AnswerQuiz, DeleteQuiz, GetAllQuizzes, GetQuiz, JoinQuiz, LeaveQuiz};
pub use speech::ConvertToSpeech;
pub use users::{GetUser, UserLogin, UserRegister};
