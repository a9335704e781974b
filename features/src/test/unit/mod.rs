mod access;
mod emit;
mod region;
