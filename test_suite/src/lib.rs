pub mod model;

#[cfg(test)]
mod filtering;
#[cfg(test)]
mod mock;
