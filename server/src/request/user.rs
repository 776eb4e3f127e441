use serde::Deserialize;

use application::transfer::{GetUserDto, LoginDto, RegisterUserDto, UpdateUserDto};

use crate::controller::Intake;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    email: String,
    password: String,
    first_name: String,
    last_name: String,
}

/// Form-encoded login credentials.
#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

#[derive(Debug)]
pub struct GetUserRequest {
    id: i64,
}

impl GetUserRequest {
    pub fn new(id: i64) -> Self {
        Self { id }
    }
}

pub struct UserTransformer;

impl Intake<RegisterRequest> for UserTransformer {
    type To = RegisterUserDto;
    fn emit(&self, input: RegisterRequest) -> Self::To {
        RegisterUserDto {
            email: input.email,
            password: input.password,
            first_name: input.first_name,
            last_name: input.last_name,
        }
    }
}

impl Intake<LoginRequest> for UserTransformer {
    type To = LoginDto;
    fn emit(&self, input: LoginRequest) -> Self::To {
        LoginDto {
            email: input.email,
            password: input.password,
        }
    }
}

impl Intake<GetUserRequest> for UserTransformer {
    type To = GetUserDto;
    fn emit(&self, input: GetUserRequest) -> Self::To {
        GetUserDto { id: input.id }
    }
}

impl Intake<(i64, UpdateUserRequest)> for UserTransformer {
    type To = UpdateUserDto;
    fn emit(&self, (id, input): (i64, UpdateUserRequest)) -> Self::To {
        UpdateUserDto {
            id,
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
        }
    }
}
