use utoipa::OpenApi;

use crate::presentation::http::app_error::{ErrorResponseDto, FieldErrorDto};
use crate::presentation::http::handlers::posts::{
    CreatePostDto, MessageDto, PostDto, UpdatePostDto,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Simple Blog API",
        description = "RESTful API for managing blog posts: list, fetch, create, update and delete.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        crate::presentation::http::handlers::posts::list_posts,
        crate::presentation::http::handlers::posts::get_post,
        crate::presentation::http::handlers::posts::create_post,
        crate::presentation::http::handlers::posts::update_post,
        crate::presentation::http::handlers::posts::delete_post
    ),
    components(
        schemas(
            CreatePostDto,
            UpdatePostDto,
            PostDto,
            MessageDto,
            ErrorResponseDto,
            FieldErrorDto
        )
    ),
    tags(
        (name = "posts", description = "Blog post endpoints")
    )
)]
pub(crate) struct ApiDoc;
