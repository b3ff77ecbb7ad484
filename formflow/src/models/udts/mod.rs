pub use answer::*;

mod answer;
