mod notes;
mod tasks;
mod users;
