
mod lifecycle;
mod persistence;
